// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod balance_invariant;
mod event_roundtrip;
mod fee_arithmetic;
