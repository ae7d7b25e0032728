//! Domain layer: pledge entities, money value objects, gateway shapes and the
//! ports through which the workflow reaches its collaborators.

pub mod gateway;
pub mod money;
pub mod outcome;
pub mod pledge;
pub mod ports;
pub mod request;
