//! @acp:module "Parser"
//! @acp:summary "Text-to-model extraction: comment blocks, doc tags, type inference, declaration scanning"
//! @acp:domain cli
//! @acp:layer service
//!
//! Everything here is a total function over its input: malformed lines are
//! skipped, unresolvable references degrade to empty signatures, and
//! unknown values infer as `any`.

pub mod comments;
pub mod infer;
pub mod scanner;
pub mod tags;

pub use comments::{
    extract_comment_block, strip_comments, strip_line_comment, PLAIN_MARKER, RICH_MARKER,
};
pub use infer::infer_value_type;
pub use scanner::{ScanResult, Scanner};
pub use tags::{parse_doc_tags, DocTags};
