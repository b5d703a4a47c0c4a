//! # synkit
//!
//! A front-end toolkit for small domain-specific languages.
//!
//! File Layout
//!
//! Everything lives under the [synkit](crate::synkit) module, split by pipeline stage:
//! src/synkit
//!   ├── lexing      Configurable tokenizer (text -> tokens)
//!   ├── parsing     Marker session and Pratt engine (tokens -> marker events)
//!   ├── building    Tree reconstruction (marker events -> concrete syntax tree)
//!   └── <shared>    Ranges, tokens, tracing, diagnostics and output formats
//!
//! For testing guidelines and the reference grammar, see the [testing module](synkit::testing).

#![allow(rustdoc::invalid_html_tags)]

pub mod synkit;
