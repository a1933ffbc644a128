#![allow(dead_code)]

pub mod source;

pub use source::{ScriptedSource, create_test_store, thread_url};
