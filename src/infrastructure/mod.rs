mod simulator;

pub use simulator::SimulatedServers;
