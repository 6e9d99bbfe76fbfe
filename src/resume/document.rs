// src/resume/document.rs
//! Resume document and the edit operations the internal editor performs on it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::blocks::{assign_block_ids, new_block_id, BlockContent, BlockId, ResumeBlock};
use super::localized::LocalizedText;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: String,
    pub slug: String,
    pub person_name: String,
    pub headline: LocalizedText,
    pub published: bool,
    pub blocks: Vec<ResumeBlock>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Editor commands accepted by `Resume::apply`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BlockEdit {
    Add {
        block: BlockContent,
        #[serde(default)]
        position: Option<usize>,
    },
    Update {
        id: BlockId,
        block: BlockContent,
    },
    Remove {
        id: BlockId,
    },
    Move {
        id: BlockId,
        direction: Direction,
    },
    MoveTo {
        id: BlockId,
        index: usize,
    },
    SetHidden {
        id: BlockId,
        hidden: bool,
    },
    ToggleHidden {
        id: BlockId,
    },
    Reorder {
        ids: Vec<BlockId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditOutcome {
    /// The block the edit touched, if any
    pub block_id: Option<BlockId>,
    /// False when the edit was accepted but did not change the document
    pub changed: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResumeEditError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Invalid block order: {0}")]
    InvalidOrder(String),
}

type EditResult<T> = std::result::Result<T, ResumeEditError>;

impl Resume {
    pub fn new(slug: String, person_name: String, headline: LocalizedText) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            slug,
            person_name,
            headline,
            published: false,
            blocks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn index_of(&self, id: &str) -> EditResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| ResumeEditError::BlockNotFound(id.to_string()))
    }

    pub fn block(&self, id: &str) -> Option<&ResumeBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn add_block(&mut self, content: BlockContent, position: Option<usize>) -> BlockId {
        let mut id = new_block_id();
        while self.block(&id).is_some() {
            id = new_block_id();
        }

        let block = ResumeBlock::with_id(id.clone(), content);
        let index = position.unwrap_or(self.blocks.len()).min(self.blocks.len());
        self.blocks.insert(index, block);
        id
    }

    pub fn update_block(&mut self, id: &str, content: BlockContent) -> EditResult<()> {
        let index = self.index_of(id)?;
        self.blocks[index].content = content;
        Ok(())
    }

    pub fn remove_block(&mut self, id: &str) -> EditResult<ResumeBlock> {
        let index = self.index_of(id)?;
        Ok(self.blocks.remove(index))
    }

    /// Swap with the neighbour. Returns false at the edges.
    pub fn move_block(&mut self, id: &str, direction: Direction) -> EditResult<bool> {
        let index = self.index_of(id)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.blocks.len() => index + 1,
            _ => return Ok(false),
        };
        self.blocks.swap(index, target);
        Ok(true)
    }

    pub fn move_block_to(&mut self, id: &str, index: usize) -> EditResult<bool> {
        let current = self.index_of(id)?;
        let target = index.min(self.blocks.len() - 1);
        if current == target {
            return Ok(false);
        }
        let block = self.blocks.remove(current);
        self.blocks.insert(target, block);
        Ok(true)
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> EditResult<bool> {
        let index = self.index_of(id)?;
        let changed = self.blocks[index].hidden != hidden;
        self.blocks[index].hidden = hidden;
        Ok(changed)
    }

    pub fn toggle_hidden(&mut self, id: &str) -> EditResult<bool> {
        let index = self.index_of(id)?;
        let block = &mut self.blocks[index];
        block.hidden = !block.hidden;
        Ok(block.hidden)
    }

    /// `ids` must name every current block exactly once
    pub fn reorder(&mut self, ids: &[BlockId]) -> EditResult<()> {
        if ids.len() != self.blocks.len() {
            return Err(ResumeEditError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.blocks.len(),
                ids.len()
            )));
        }

        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if unique.len() != ids.len() {
            return Err(ResumeEditError::InvalidOrder("duplicate ids".to_string()));
        }

        let current: HashSet<&str> = self.blocks.iter().map(|b| b.id.as_str()).collect();
        if let Some(unknown) = ids.iter().find(|id| !current.contains(id.as_str())) {
            return Err(ResumeEditError::BlockNotFound(unknown.clone()));
        }

        let mut remaining = std::mem::take(&mut self.blocks);
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(pos) = remaining.iter().position(|b| &b.id == id) {
                ordered.push(remaining.swap_remove(pos));
            }
        }

        self.blocks = ordered;
        Ok(())
    }

    /// Replace all blocks, assigning ids where missing or duplicated
    pub fn replace_blocks(&mut self, mut blocks: Vec<ResumeBlock>) -> usize {
        let assigned = assign_block_ids(&mut blocks);
        self.blocks = blocks;
        self.touch();
        assigned
    }

    pub fn apply(&mut self, edit: BlockEdit) -> EditResult<EditOutcome> {
        let outcome = match edit {
            BlockEdit::Add { block, position } => {
                let id = self.add_block(block, position);
                EditOutcome {
                    block_id: Some(id),
                    changed: true,
                }
            }
            BlockEdit::Update { id, block } => {
                self.update_block(&id, block)?;
                EditOutcome {
                    block_id: Some(id),
                    changed: true,
                }
            }
            BlockEdit::Remove { id } => {
                self.remove_block(&id)?;
                EditOutcome {
                    block_id: Some(id),
                    changed: true,
                }
            }
            BlockEdit::Move { id, direction } => {
                let changed = self.move_block(&id, direction)?;
                EditOutcome {
                    block_id: Some(id),
                    changed,
                }
            }
            BlockEdit::MoveTo { id, index } => {
                let changed = self.move_block_to(&id, index)?;
                EditOutcome {
                    block_id: Some(id),
                    changed,
                }
            }
            BlockEdit::SetHidden { id, hidden } => {
                let changed = self.set_hidden(&id, hidden)?;
                EditOutcome {
                    block_id: Some(id),
                    changed,
                }
            }
            BlockEdit::ToggleHidden { id } => {
                self.toggle_hidden(&id)?;
                EditOutcome {
                    block_id: Some(id),
                    changed: true,
                }
            }
            BlockEdit::Reorder { ids } => {
                let before: Vec<BlockId> = self.blocks.iter().map(|b| b.id.clone()).collect();
                self.reorder(&ids)?;
                EditOutcome {
                    block_id: None,
                    changed: before != ids,
                }
            }
        };

        if outcome.changed {
            self.touch();
        }
        Ok(outcome)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Block problems that keep the resume from being published
    pub fn content_problems(&self) -> Vec<String> {
        self.blocks.iter().flat_map(|b| b.validate()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::blocks::{QuoteBlock, SectionHeadingBlock};

    fn heading(text: &str) -> BlockContent {
        BlockContent::SectionHeading(SectionHeadingBlock { text: text.into() })
    }

    fn resume_with(ids: &[&str]) -> Resume {
        let mut resume = Resume::new("anna".into(), "Anna".into(), "Konsult".into());
        resume.blocks = ids
            .iter()
            .map(|id| ResumeBlock::with_id(*id, heading(id)))
            .collect();
        resume
    }

    fn ids(resume: &Resume) -> Vec<&str> {
        resume.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_add_block_appends_or_inserts() {
        let mut resume = resume_with(&["a", "b"]);
        let appended = resume.add_block(heading("c"), None);
        let inserted = resume.add_block(heading("first"), Some(0));
        let clamped = resume.add_block(heading("last"), Some(99));

        assert_eq!(resume.blocks[0].id, inserted);
        assert_eq!(resume.blocks[3].id, appended);
        assert_eq!(resume.blocks[4].id, clamped);
        assert!(appended.starts_with("blk_"));
    }

    #[test]
    fn test_update_keeps_id_and_visibility() {
        let mut resume = resume_with(&["a"]);
        resume.blocks[0].hidden = true;

        let quote = BlockContent::Quote(QuoteBlock {
            text: "Bra jobbat".into(),
            attribution: None,
        });
        resume.update_block("a", quote.clone()).unwrap();

        assert_eq!(resume.blocks[0].id, "a");
        assert!(resume.blocks[0].hidden);
        assert_eq!(resume.blocks[0].content, quote);
    }

    #[test]
    fn test_move_block_edges() {
        let mut resume = resume_with(&["a", "b", "c"]);

        assert!(!resume.move_block("a", Direction::Up).unwrap());
        assert!(!resume.move_block("c", Direction::Down).unwrap());
        assert!(resume.move_block("a", Direction::Down).unwrap());
        assert_eq!(ids(&resume), vec!["b", "a", "c"]);

        assert!(resume.move_block_to("c", 0).unwrap());
        assert_eq!(ids(&resume), vec!["c", "b", "a"]);
        assert!(resume.move_block_to("c", 10).unwrap());
        assert_eq!(ids(&resume), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unknown_block_is_reported() {
        let mut resume = resume_with(&["a"]);
        assert_eq!(
            resume.remove_block("zzz").unwrap_err(),
            ResumeEditError::BlockNotFound("zzz".into())
        );
        assert!(resume.toggle_hidden("zzz").is_err());
    }

    #[test]
    fn test_visibility_toggles() {
        let mut resume = resume_with(&["a", "b"]);

        assert!(resume.toggle_hidden("a").unwrap());
        assert!(!resume.set_hidden("a", true).unwrap());
        assert_eq!(resume.blocks.iter().filter(|b| b.hidden).count(), 1);
        assert!(!resume.toggle_hidden("a").unwrap());
    }

    #[test]
    fn test_reorder_requires_permutation() {
        let mut resume = resume_with(&["a", "b", "c"]);

        resume
            .reorder(&["c".into(), "a".into(), "b".into()])
            .unwrap();
        assert_eq!(ids(&resume), vec!["c", "a", "b"]);

        assert!(matches!(
            resume.reorder(&["c".into(), "a".into()]),
            Err(ResumeEditError::InvalidOrder(_))
        ));
        assert!(matches!(
            resume.reorder(&["c".into(), "c".into(), "a".into()]),
            Err(ResumeEditError::InvalidOrder(_))
        ));
        assert!(matches!(
            resume.reorder(&["c".into(), "a".into(), "x".into()]),
            Err(ResumeEditError::BlockNotFound(_))
        ));
        // failed reorders leave the order untouched
        assert_eq!(ids(&resume), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_apply_touches_only_on_change() {
        let mut resume = resume_with(&["a", "b"]);
        let before = resume.updated_at;

        let outcome = resume
            .apply(BlockEdit::Move {
                id: "a".into(),
                direction: Direction::Up,
            })
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(resume.updated_at, before);

        let outcome = resume
            .apply(BlockEdit::Add {
                block: heading("new"),
                position: Some(1),
            })
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(resume.blocks[1].id, outcome.block_id.unwrap());
    }

    #[test]
    fn test_block_edit_json() {
        let edit: BlockEdit =
            serde_json::from_str(r#"{"op":"move","id":"a","direction":"down"}"#).unwrap();
        assert!(matches!(edit, BlockEdit::Move { direction: Direction::Down, .. }));

        let edit: BlockEdit = serde_json::from_str(
            r#"{"op":"add","block":{"type":"section_heading","text":{"sv":"Erfarenhet","en":"Experience"}}}"#,
        )
        .unwrap();
        assert!(matches!(edit, BlockEdit::Add { position: None, .. }));
    }

    #[test]
    fn test_replace_blocks_assigns_ids() {
        let mut resume = resume_with(&[]);
        let assigned = resume.replace_blocks(vec![
            ResumeBlock::new(heading("x")),
            ResumeBlock::new(heading("y")),
        ]);
        assert_eq!(assigned, 2);
        assert_ne!(resume.blocks[0].id, resume.blocks[1].id);
    }
}
