//! CAP Sources - Source Adapters (SA) and Relevance Scorer (C6)
//!
//! One [`SourceAdapter`] implementation per knowledge source. Every
//! control-plane-backed source shares a single pipeline, [`GenericAdapter`],
//! parameterized by a [`Projector`] that knows how to turn a raw `Record`
//! into a title/summary/type-boost triple. `context7` is the exception: it
//! has no control-plane collection to query, so it implements the trait
//! directly.

mod adapter;
mod context7;
mod crew;
mod generic;
mod jam;
mod kanban;
mod keywords;
mod mem;
mod projector;
mod scorer;
mod search;

pub use adapter::SourceAdapter;
pub use context7::{extract_library_names, resolve_library_id, Context7Adapter, DocsFetcher, NullDocsFetcher};
pub use crew::{adapter as crew_adapter, CrewProjector};
pub use generic::GenericAdapter;
pub use jam::{adapter as jam_adapter, JamProjector};
pub use kanban::{adapter as kanban_adapter, KanbanProjector};
pub use keywords::{extract_keywords, keyword_score};
pub use mem::{adapter as mem_adapter, MemProjector};
pub use projector::{truncate_chars, Projector};
pub use scorer::{age_penalty, relevance, BASE_RELEVANCE};
pub use search::{adapter as search_adapter, SearchProjector};
