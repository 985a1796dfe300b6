//! Native `MutationObserver` bridge.
//!
//! Records are converted into core [`MutationRecord`]s. The observer watches
//! child lists and attributes across the whole subtree; character data is
//! left out since typing is reported through `input` events.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit, Node, NodeList};

use weft_surface_core::{MutationBatch, MutationRecord};

/// Collect a `NodeList` into owned handles.
pub fn node_list(list: &NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

/// Convert one native record. Unobserved record types yield `None`.
pub fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord<Node>> {
    let target = record.target()?;
    match record.type_().as_str() {
        "childList" => Some(MutationRecord::ChildList {
            target,
            added: node_list(&record.added_nodes()),
            removed: node_list(&record.removed_nodes()),
        }),
        "attributes" => Some(MutationRecord::Attributes {
            target,
            name: record.attribute_name()?.into(),
        }),
        _ => None,
    }
}

/// Convert the record array handed to an observer callback.
pub fn convert_records(records: &js_sys::Array) -> MutationBatch<Node> {
    records
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|record| convert_record(&record))
        .collect()
}

/// A live observer on the editable root.
///
/// Disconnects when dropped.
pub struct DomObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl DomObserver {
    /// Start observing `root`, handing each non-empty batch to `on_batch`.
    pub fn install<F>(root: &Node, mut on_batch: F) -> Result<Self, JsValue>
    where
        F: FnMut(MutationBatch<Node>) + 'static,
    {
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch = convert_records(&records);
                if !batch.is_empty() {
                    on_batch(batch);
                }
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        observer.observe_with_options(root, &init)?;

        tracing::debug!("mutation observer installed");
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    /// Drain records queued since the last callback.
    pub fn take_batch(&self) -> Option<MutationBatch<Node>> {
        let batch = convert_records(&self.observer.take_records());
        (!batch.is_empty()).then_some(batch)
    }
}

impl Drop for DomObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
