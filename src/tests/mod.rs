//! Scenario tests that drive the whole rendering pipeline.

mod render_tests;
