// Application layer - Report generation use case and its collaborators
pub mod artifact_store;
pub mod dashboard_source;
pub mod document_assembler;
pub mod document_writer;
pub mod error;
pub mod panel_fetcher;
pub mod report_service;

#[cfg(test)]
pub mod testing;
