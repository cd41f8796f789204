//! Integration tests for extbuild-lib.

mod common;
mod extension_tests;
mod swig_tests;
