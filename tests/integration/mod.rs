mod fact_source_integration;
mod service_integration;
