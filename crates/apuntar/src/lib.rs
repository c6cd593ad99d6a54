//! Apuntar: locator generation and scoring for browser test automation.
//!
//! Given a document snapshot and a pointed-at element, the engine
//! enumerates candidate locators across strategy families (ids, test
//! attributes, classes, stable scopes, text, structural position, XPath),
//! verifies each against the document so that every emitted candidate
//! resolves to exactly the target, scores them for robustness, and buckets
//! them for presentation in either a Cypress-style or raw-JavaScript
//! dialect.
//!
//! ```
//! use apuntar::{Session, Dialect};
//! use apuntar_dom::{el, DocumentBuilder};
//!
//! let doc = DocumentBuilder::new()
//!     .body_child(el("button").id("save-btn").text("Save"))
//!     .build();
//! let button = doc.all_elements().into_iter().last().unwrap();
//!
//! let mut session = Session::default();
//! let buckets = session.generate(&doc, button).unwrap();
//! assert_eq!(buckets.best().unwrap().rendered, "cy.get('#save-btn')");
//!
//! let switched = session.set_dialect(Dialect::Js).unwrap();
//! assert_eq!(
//!     switched.best().unwrap().rendered,
//!     "document.querySelector('#save-btn')"
//! );
//! ```

pub mod actionable;
pub mod address;
pub mod budget;
pub mod categorize;
pub mod config;
pub mod oracle;
pub mod score;
pub mod session;
pub mod snap;
pub mod strategies;
pub mod text;

mod result;

pub use actionable::{available_actions, classify, Action, Actionable};
pub use address::{Address, AddressKind, Candidate, Dialect, TextConstraints};
pub use budget::{BudgetGuard, StrategyCost};
pub use categorize::{categorize, CategorizedCandidates};
pub use config::GeneratorConfig;
pub use oracle::UniquenessOracle;
pub use result::{ApuntarError, ApuntarResult};
pub use score::{normalize, score_address};
pub use session::Session;
pub use snap::{resolve_target, ResolvedTarget};
