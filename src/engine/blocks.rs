// SPDX-License-Identifier: MIT

//! Text block selection
//!
//! A block is a named slot with an ordered list of `(when, template)` rules.
//! Rules are tried top to bottom and the first one whose condition holds
//! supplies the block's template.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::condition::Condition;
use super::context::Context;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRule {
    #[serde(alias = "cuando", alias = "condition")]
    pub when: Condition,
    #[serde(alias = "plantilla")]
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    #[serde(alias = "reglas", default)]
    pub rules: Vec<BlockRule>,
}

/// Outcome of selecting a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelection<'a> {
    Matched { rule_index: usize, template: &'a str },
    NoMatch,
}

impl<'a> BlockSelection<'a> {
    pub fn template(&self) -> Option<&'a str> {
        match self {
            BlockSelection::Matched { template, .. } => Some(template),
            BlockSelection::NoMatch => None,
        }
    }
}

impl BlockRule {
    pub fn new(when: impl Into<Condition>, template: impl Into<String>) -> Self {
        Self {
            when: when.into(),
            template: template.into(),
        }
    }
}

impl BlockDefinition {
    pub fn new(id: impl Into<String>, rules: Vec<BlockRule>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }
}

/// First matching rule, with its position
pub fn select_block_detailed<'a>(
    block: &'a BlockDefinition,
    context: &Context,
) -> BlockSelection<'a> {
    for (rule_index, rule) in block.rules.iter().enumerate() {
        if rule.when.evaluate(context) {
            log::debug!(
                "Block '{}': condition '{}' matched",
                block.id,
                rule.when.source()
            );
            return BlockSelection::Matched {
                rule_index,
                template: &rule.template,
            };
        }
    }

    log::debug!("Block '{}': no condition matched", block.id);
    BlockSelection::NoMatch
}

/// Template of the first matching rule; `None` when no rule matches
pub fn select_block<'a>(block: &'a BlockDefinition, context: &Context) -> Option<&'a str> {
    select_block_detailed(block, context).template()
}

/// Select every block, substituting an empty string where nothing matched
pub fn select_all_blocks(blocks: &[BlockDefinition], context: &Context) -> BTreeMap<String, String> {
    blocks
        .iter()
        .map(|block| {
            let template = select_block(block, context).unwrap_or_default();
            (block.id.clone(), template.to_string())
        })
        .collect()
}
