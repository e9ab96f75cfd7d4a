//! 数据传输对象模块

pub mod unified;

pub use unified::*;
