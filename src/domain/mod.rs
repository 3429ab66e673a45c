// Domain layer: core models, collaborator payloads and ports. No I/O here.

pub mod model;
pub mod payload;
pub mod ports;
