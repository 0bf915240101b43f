pub mod communities;
pub mod correlation;
pub mod loading;
pub mod network;
pub mod presence;
pub mod report;
