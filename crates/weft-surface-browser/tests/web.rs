//! WASM browser tests for weft-surface-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use web_sys::{Event, HtmlElement, KeyboardEvent, KeyboardEventInit, Node};

use weft_surface_browser::events::key_input;
use weft_surface_browser::{
    BrowserHost, DomDocument, HeightChannel, HostTransport, KeyOutcome, SurfaceConfig,
    SurfaceDocument, codec, image, mount,
};

fn editor_div() -> HtmlElement {
    let document = gloo_utils::document();
    let div = document
        .create_element("div")
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    div.set_id("editor");
    div.set_content_editable("true");
    gloo_utils::body().append_child(&div).unwrap();
    div
}

fn remove(div: &HtmlElement) {
    div.remove();
}

// === Mounting ===

#[wasm_bindgen_test]
fn test_mount_seeds_empty_document() {
    let div = editor_div();
    let handle = mount(div.clone(), SurfaceConfig::default()).unwrap();

    let html = handle.with(|surface| surface.exported_html()).unwrap();
    assert_eq!(html, "<p>\u{200B}</p>");
    assert_eq!(div.inner_html(), "<p>\u{200B}</p>");

    drop(handle);
    remove(&div);
}

#[wasm_bindgen_test]
fn test_set_html_round_trips_through_encoding() {
    let div = editor_div();
    let handle = mount(div.clone(), SurfaceConfig::default()).unwrap();

    let html = "<p>Hello <b>world</b></p>";
    handle
        .with(|surface| surface.set_html(&codec::encode(html), None))
        .unwrap()
        .unwrap();

    assert_eq!(div.inner_html(), html);
    let encoded = handle.with(|surface| surface.encoded_html()).unwrap();
    assert_eq!(codec::decode(&encoded).unwrap(), html);

    drop(handle);
    remove(&div);
}

#[wasm_bindgen_test]
fn test_inserted_image_gets_wrapper_and_width() {
    let div = editor_div();
    let handle = mount(div.clone(), SurfaceConfig::default()).unwrap();

    handle
        .with(|surface| {
            surface
                .set_html(&codec::encode(r#"<p><img src="data:,"></p>"#), None)
                .unwrap();
            surface.pump_mutations();
        })
        .unwrap();

    let selector = format!(".{}", image::WRAPPER_CLASS);
    let wrapper = div.query_selector(&selector).unwrap();
    assert!(wrapper.is_some(), "image should be wrapped for resizing");
    let exported = handle.with(|surface| surface.exported_html()).unwrap();
    assert!(exported.contains("data-width="), "{exported}");
    assert!(!exported.contains(image::WRAPPER_CLASS), "{exported}");

    drop(handle);
    remove(&div);
}

#[wasm_bindgen_test]
fn test_reentrant_access_is_refused() {
    let div = editor_div();
    let handle = mount(div.clone(), SurfaceConfig::default()).unwrap();

    let nested = handle
        .with(|_| handle.with(|surface| surface.exported_html()).is_err())
        .unwrap();
    assert!(nested);

    drop(handle);
    remove(&div);
}

// === DomDocument ===

#[wasm_bindgen_test]
fn test_unchanged_attribute_write_is_skipped() {
    let div = editor_div();
    let mut doc = DomDocument::new(div.clone()).unwrap();
    let root: Node = div.clone().into();

    doc.set_attribute(&root, "data-x", "1");
    assert_eq!(doc.attribute(&root, "data-x").as_deref(), Some("1"));
    doc.set_attribute(&root, "data-x", "1");
    doc.remove_attribute(&root, "data-missing");
    assert_eq!(doc.attribute(&root, "data-x").as_deref(), Some("1"));

    remove(&div);
}

#[wasm_bindgen_test]
fn test_empty_style_value_clears_attribute() {
    let div = editor_div();
    let mut doc = DomDocument::new(div.clone()).unwrap();
    let root: Node = div.clone().into();

    doc.set_style_property(&root, "width", "120px");
    assert_eq!(doc.style_property(&root, "width").as_deref(), Some("120px"));
    doc.set_style_property(&root, "width", "");
    assert_eq!(doc.style_property(&root, "width"), None);
    assert!(!div.has_attribute("style"));

    remove(&div);
}

#[wasm_bindgen_test]
fn test_node_len_counts_characters_and_children() {
    let div = editor_div();
    div.set_inner_html("<p>abc</p><p></p>");
    let doc = DomDocument::new(div.clone()).unwrap();
    let root: Node = div.clone().into();

    assert_eq!(doc.node_len(&root), 2);
    let first = doc.children(&root).remove(0);
    assert_eq!(doc.tag_name(&first).as_deref(), Some("p"));
    let text = doc.children(&first).remove(0);
    assert_eq!(doc.node_len(&text), 3);
    assert_eq!(doc.tag_name(&text), None);

    remove(&div);
}

#[wasm_bindgen_test]
fn test_load_listener_reports_image_once() {
    let div = editor_div();
    div.set_inner_html(r#"<p><img src="data:,"></p>"#);
    let mut doc = DomDocument::new(div.clone()).unwrap();
    let loaded: Rc<RefCell<Vec<Node>>> = Rc::default();
    let seen = loaded.clone();
    doc.set_load_sink(Rc::new(move |node| seen.borrow_mut().push(node)));

    let img = doc.images_under(&div.clone().into()).remove(0);
    image::ImageGeometry::ensure_load_listener(&mut doc, &img);
    image::ImageGeometry::ensure_load_listener(&mut doc, &img);
    assert!(doc.has_load_listener(&img));

    img.dispatch_event(&Event::new("load").unwrap()).unwrap();
    assert_eq!(loaded.borrow().len(), 1);
    assert!(loaded.borrow()[0].is_same_node(Some(&img)));

    drop(doc);
    img.dispatch_event(&Event::new("load").unwrap()).unwrap();
    assert_eq!(loaded.borrow().len(), 2, "listener outlives the document wrapper");

    remove(&div);
}

// === Host ===

#[wasm_bindgen_test]
fn test_top_window_has_no_height_channel() {
    let window = gloo_utils::window();
    let framed = window
        .parent()
        .ok()
        .flatten()
        .is_some_and(|parent| !js_sys::Object::is(&parent, &window));
    let mut host = BrowserHost::new();
    assert!(!host.has_state_callback());
    assert!(!host.has_height_channel(HeightChannel::NativeBridge));
    assert!(host.post_height(HeightChannel::NativeBridge, 100.0).is_err());
    if !framed {
        assert_eq!(HeightChannel::select(&host), None);
    }
}

#[wasm_bindgen_test]
fn test_state_callback_runs_after_current_task() {
    let window = gloo_utils::window();
    let calls = js_sys::Array::new();
    let callback = js_sys::Object::new();
    let update = js_sys::Function::new_with_args("changed", "this.calls.push(changed);");
    js_sys::Reflect::set(&callback, &"calls".into(), &calls).unwrap();
    js_sys::Reflect::set(&callback, &"updateEditorState".into(), &update).unwrap();
    js_sys::Reflect::set(&window, &"editorCallback".into(), &callback).unwrap();

    let mut host = BrowserHost::new();
    assert!(host.has_state_callback());
    assert!(host.notify_state_changed(true).is_ok());
    assert_eq!(calls.length(), 0, "delivery waits for the next task");

    js_sys::Reflect::delete_property(&window, &"editorCallback".into()).unwrap();
    assert!(!host.has_state_callback());
    assert!(host.notify_state_changed(false).is_err());
}

// === Keyboard ===

#[wasm_bindgen_test]
fn test_key_input_reads_modifiers() {
    let init = KeyboardEventInit::new();
    init.set_key("b");
    init.set_ctrl_key(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();

    let key = key_input(&event);
    assert_eq!(key.key, "b");
    assert!(key.ctrl);
    assert!(!key.alt);
}

#[wasm_bindgen_test]
fn test_plain_key_passes_through() {
    let div = editor_div();
    let handle = mount(div.clone(), SurfaceConfig::default()).unwrap();

    let init = KeyboardEventInit::new();
    init.set_key("a");
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    let outcome = handle
        .with(|surface| surface.on_key_down(&key_input(&event)))
        .unwrap();
    assert_eq!(outcome, KeyOutcome::Default);

    drop(handle);
    remove(&div);
}
