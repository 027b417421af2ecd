#![allow(dead_code, unused_imports)]

pub use nbrun_test_utils::{init_tracing, with_timeout};
