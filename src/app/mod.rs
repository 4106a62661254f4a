// Application layer: concrete pipelines wired from configuration.

pub mod pipelines;
