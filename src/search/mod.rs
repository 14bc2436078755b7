//! Search request pipeline: parameter parsing, engine dispatch, failure
//! classification and response assembly.

pub mod orchestrator;
pub mod response;

pub use orchestrator::{run_search, SearchError, SearchOutcome};
pub use response::{SearchArguments, SearchFields, SearchPage};
