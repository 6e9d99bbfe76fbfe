// src/seo/text.rs
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    blocks: Vec<Regex>,
    comments: Regex,
    tags: Regex,
    numeric_entity: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        blocks: ["script", "style", "noscript", "template"]
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                    .expect("valid block pattern")
            })
            .collect(),
        comments: Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"),
        tags: Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"),
        numeric_entity: Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity pattern"),
        whitespace: Regex::new(r"\s+").expect("valid whitespace pattern"),
    })
}

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&ndash;", "–"),
    ("&mdash;", "—"),
    ("&hellip;", "…"),
    ("&aring;", "å"),
    ("&auml;", "ä"),
    ("&ouml;", "ö"),
    ("&Aring;", "Å"),
    ("&Auml;", "Ä"),
    ("&Ouml;", "Ö"),
    ("&eacute;", "é"),
];

fn decode_entities(text: &str) -> String {
    let p = patterns();
    let mut decoded = p
        .numeric_entity
        .replace_all(text, |caps: &regex::Captures| {
            let raw = &caps[1];
            let code = match raw.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => raw.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_default()
        })
        .into_owned();

    for (entity, replacement) in NAMED_ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }
    // Last, so "&amp;lt;" stays "&lt;"
    decoded.replace("&amp;", "&")
}

/// Visible text of an HTML document, whitespace collapsed
pub fn strip_html(html: &str) -> String {
    let p = patterns();

    let mut text = p.comments.replace_all(html, " ").into_owned();
    for block in &p.blocks {
        text = block.replace_all(&text, " ").into_owned();
    }
    let text = p.tags.replace_all(&text, " ");
    let text = decode_entities(&text);

    p.whitespace.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_scripts_styles_and_comments() {
        let html = r#"
            <html><head>
              <style>body { color: red; }</style>
              <SCRIPT type="text/javascript">var x = "<p>not text</p>";</SCRIPT>
            </head>
            <body>
              <!-- hidden <b>comment</b> -->
              <h1>Rubrik</h1><p>Första&nbsp;stycket.</p>
              <noscript>Enable JS</noscript>
            </body></html>
        "#;

        assert_eq!(strip_html(html), "Rubrik Första stycket.");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            strip_html("<p>R&amp;D &lt;3 &#229;r &#x2013; &quot;ok&quot; &amp;lt;</p>"),
            "R&D <3 år – \"ok\" &lt;"
        );
    }

    #[test]
    fn test_block_tags_do_not_glue_words() {
        assert_eq!(strip_html("<li>one</li><li>two</li>"), "one two");
        assert_eq!(strip_html(""), "");
    }
}
