//! Projection, ordering and windowing of read queries.

mod find;
mod group_by;
mod order;
mod pagination;
mod select;

pub use find::FindManyArgs;
pub use group_by::{Aggregate, AggregateSelection, GroupByArgs, GroupOrderBy};
pub use order::{NullsOrder, OrderBy, RelevanceOrder, SortOrder};
pub use pagination::Pagination;
pub use select::{
    COUNT_KEY, CountSelection, CountedRelation, Include, Projection, RelationSelection, Select,
};

pub(crate) use find::ArgsScope;
pub(crate) use order::parse_order_by;
pub(crate) use select::{parse_include, parse_select, reject_unknown_arguments};
