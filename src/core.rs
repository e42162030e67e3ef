//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Matrix Harness:
//! data sources, dimensions and matrices, parameterized tests, the
//! guarded execution protocol and the executor that ties them together.
//!
//! 此模块包含 Matrix Harness 的核心功能：
//! 数据源、维度与矩阵、参数化测试、受保护的执行协议以及将它们串联起来的执行器。

pub mod config;
pub mod data_source;
pub mod execution;
pub mod executor;
pub mod matrix;
pub mod models;
pub mod parameterized;
pub mod planner;

// Re-exports
pub use executor::Executor;
pub use models::TestResult;
