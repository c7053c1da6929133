pub mod prepare_env;
pub mod scripted_gateway;

pub use scripted_gateway::ScriptedGateway;
