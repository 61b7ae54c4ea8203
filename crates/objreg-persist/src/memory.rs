use objreg_store::ObjectRecord;

use crate::error::PersistResult;
use crate::stream::{ObjectReader, ObjectWriter, StreamEntry, StreamItem};

/// An in-process stream: written records can be read back directly.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStream {
    entries: Vec<StreamEntry>,
}

impl InMemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<StreamEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }

    /// Names of all entries in stream order.
    pub fn written_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ObjectReader for InMemoryStream {
    fn all(&self) -> PersistResult<Vec<StreamItem>> {
        Ok(self
            .entries
            .iter()
            .cloned()
            .map(StreamEntry::into_item)
            .collect())
    }
}

impl ObjectWriter for InMemoryStream {
    fn write_object(&mut self, record: &ObjectRecord) -> PersistResult<()> {
        self.entries.push(StreamEntry::from_record(record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use objreg_store::StoredValue;
    use objreg_types::TypeDescriptor;

    use super::*;

    struct Unit;
    impl StoredValue for Unit {}

    #[test]
    fn written_records_read_back_in_order() {
        let ty = TypeDescriptor::derived("unit").unwrap();
        let mut stream = InMemoryStream::new();
        for name in ["one", "two"] {
            let rec = ObjectRecord::standalone(name, ty.clone(), Arc::new(Unit)).unwrap();
            stream.write_object(&rec).unwrap();
        }

        assert_eq!(stream.len(), 2);
        let names = stream.names().unwrap();
        assert_eq!(
            names,
            vec![(ty.clone(), "one".to_string()), (ty, "two".to_string())]
        );
    }

    #[test]
    fn duplicate_names_resolve_to_first_in_stream() {
        let ty = TypeDescriptor::derived("unit").unwrap();
        let other = TypeDescriptor::derived("other").unwrap();
        let mut stream = InMemoryStream::new();
        stream
            .write_object(&ObjectRecord::standalone("x", ty.clone(), Arc::new(Unit)).unwrap())
            .unwrap();
        stream
            .write_object(&ObjectRecord::standalone("x", other, Arc::new(Unit)).unwrap())
            .unwrap();

        let items = stream.by_name(&["x".to_string()]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].type_desc.as_ref(), Some(&ty));
    }
}
