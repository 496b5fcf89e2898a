//! Test suite for Souq Chat
//!
//! This module organizes all tests

pub mod property;
