//! 留言板核心领域模型
//!
//! 包含参与者、消息等核心实体，统一的文本清洗规则，以及存储层的抽象接口。

pub mod errors;
pub mod message;
pub mod participant;
pub mod repository;
pub mod sanitize;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use message::*;
pub use participant::*;
pub use repository::*;
pub use sanitize::sanitize;
pub use value_objects::*;
