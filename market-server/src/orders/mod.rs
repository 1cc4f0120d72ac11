//! 订单领域逻辑
//!
//! 订单生命周期的纯逻辑部分，与持久层解耦：
//!
//! - [`ids`] - 订单号与取货码生成
//! - [`pricing`] - 费用计算与校验
//! - [`status`] - 状态机转换表
//! - [`policy`] - 角色能力检查

pub mod ids;
pub mod policy;
pub mod pricing;
pub mod status;

pub use ids::{generate_order_number, generate_pickup_code};
pub use policy::{OrderAction, OrderRelation};
pub use pricing::{FeeSchedule, Quote};
