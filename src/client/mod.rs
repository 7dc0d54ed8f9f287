//! Client side of the app: role resolution, the admin bootstrap flow, the
//! question catalog, quiz sessions and routing, all talking to the server
//! through [`RemoteDataService`].

pub mod bootstrap;
pub mod cache;
pub mod catalog;
pub mod context;
pub mod guard;
pub mod remote;
pub mod results;
pub mod role;
pub mod session;

pub use bootstrap::{BootstrapError, BootstrapFlow, BootstrapState};
pub use cache::{QueryCache, QueryKey};
pub use catalog::{CatalogStats, QuestionCatalogClient, QuestionDraft};
pub use context::SessionContext;
pub use guard::{decide, navigation_links, AppRoute, GuardDecision, NavLink};
pub use remote::{GraphqlRemote, InProcessRemote, RemoteDataService};
pub use results::{Rating, ResultsSummary, SubmissionHistoryClient};
pub use role::{Role, RoleResolver};
pub use session::{reconcile, QuestionOutcome, QuizSession, SessionPhase};
