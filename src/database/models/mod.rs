pub mod edge;
pub mod form;
pub mod form_version;
pub mod project;
pub mod question;
pub mod response;
pub mod team;

pub use edge::Edge;
pub use form::{Form, FormView};
pub use form_version::FormVersion;
pub use project::Project;
pub use question::{Question, QuestionOption, QuestionWithOptions};
pub use response::Response;
pub use team::{Team, TeamMember};
