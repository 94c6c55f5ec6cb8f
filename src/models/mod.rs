pub mod category;
pub mod observation;
pub mod station;
pub mod table;

pub use category::{CategoryDescriptor, FieldCatalog, SubFieldKind};
pub use observation::{DecodedRecord, FieldValue, MandatoryRecord, Observation};
pub use station::{StationId, YearRange};
pub use table::{Cell, ColumnKind, ColumnSpec, ObservationTable, ObservationTableBuilder};
