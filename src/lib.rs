//! sitegen is a static site generator that drives an external document
//! converter. It discovers Markdown sources, expands index pages with the
//! metadata of their descendants, and runs template passes before and after
//! conversion.

/// Command-line interface module for the sitegen application
pub mod cli;

/// Configuration handling: defaults, layering and validation
pub mod config;

/// Reserved keys and built-in defaults
pub mod constants;

/// Converter argument construction and subprocess invocation
pub mod converter;

/// YAML loading with the `!join` directive, and global data
pub mod data;

/// Front-matter document model
pub mod document;

/// Error types and handling for the sitegen application
pub mod error;

/// RSS feeds for index pages
pub mod feed;

/// Index page aggregation and synthetic documents
pub mod index;

/// Logging setup
pub mod logger;

/// Page generation orchestration
pub mod processor;

/// Incremental rebuild decisions
pub mod rebuild;

/// Template rendering
pub mod renderer;
