//! 共享库
//!
//! 规则引擎各二进制程序共用的配置加载和日志初始化。

pub mod config;
pub mod observability;
