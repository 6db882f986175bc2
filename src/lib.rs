//! Stepwise core library.
//!
//! Evaluates pre-parsed Gherkin features. A feature passes through the
//! [`normalize`] stage, which expands outlines, binds data records, and
//! resolves meta imports, and is then run by [`eval`], which resolves each
//! step against the [`stepdef`] registry or hands it to a literal
//! [`actions::StepAction`]. Attribute reads and writes go through the
//! [`scope`] stack, and statuses aggregate with [`status::fold`].

pub mod actions;
pub mod ast;
pub mod attachments;
pub mod cli;
pub mod eval;
pub mod normalize;
pub mod runner;
pub mod scope;
pub mod settings;
pub mod status;
pub mod stepdef;
