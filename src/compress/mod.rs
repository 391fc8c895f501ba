use std::fmt::{self, Display, Formatter};

use crate::ast::{NodeId, NodeMap};
use crate::symbol::ScopeMap;

mod blocks;
mod booleans;
mod folding;
mod hoist;
mod returns;
mod unreachable;

pub use folding::{apply_global_defines, node_to_value, value_to_ast, GlobalDefines};

#[cfg(test)]
mod tests;

/// Enumerated pass toggles. Every pass defaults to on; `max_passes` bounds
/// the fixed-point loop.
#[derive(Clone, Debug)]
pub struct CompressOptions {
    pub unreachable_code_elimination: bool,
    pub empty_statement_elimination: bool,
    pub block_elimination: bool,
    pub boolean_compress: bool,
    pub function_return_compress: bool,
    pub variable_hoisting: bool,
    pub max_passes: u32,
}

impl Default for CompressOptions {
    fn default() -> CompressOptions {
        CompressOptions {
            unreachable_code_elimination: true,
            empty_statement_elimination: true,
            block_elimination: true,
            boolean_compress: true,
            function_return_compress: true,
            variable_hoisting: true,
            max_passes: 8,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CompressError {
    // Constructs the unreachable-code pass does not support yet.
    NotImplemented(&'static str),
}

impl Display for CompressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CompressError::NotImplemented(what) => {
                write!(f, "compression is not implemented for {}", what)
            }
        }
    }
}

impl std::error::Error for CompressError {}

pub type CompressResult<T> = Result<T, CompressError>;

/// Runs the enabled passes in a documented order (fold, unreachable, blocks
/// and empties, booleans, returns, hoisting) until none of them changes the
/// tree or `max_passes` is reached. Compression is idempotent at the fixed
/// point: running it again on its own output yields the same tree.
pub fn compress(
    map: &mut NodeMap,
    scopes: &ScopeMap,
    root: NodeId,
    options: &CompressOptions,
) -> CompressResult<()> {
    for _ in 0..options.max_passes {
        let mut changed = false;
        // Folding is the evaluation substrate for the condition-driven passes, so it is not
        // independently toggleable.
        changed |= folding::fold_constants(map, root);
        if options.unreachable_code_elimination {
            changed |= unreachable::eliminate_unreachable_code(map, scopes, root)?;
        };
        if options.block_elimination || options.empty_statement_elimination {
            changed |= blocks::eliminate_blocks_and_empties(
                map,
                scopes,
                root,
                options.block_elimination,
                options.empty_statement_elimination,
            );
        };
        if options.boolean_compress {
            changed |= booleans::compress_booleans(map, root);
        };
        if options.function_return_compress {
            changed |= returns::compress_function_returns(map, root);
        };
        if options.variable_hoisting {
            changed |= hoist::hoist_variables(map, scopes, root);
        };
        if !changed {
            break;
        };
    }
    Ok(())
}
