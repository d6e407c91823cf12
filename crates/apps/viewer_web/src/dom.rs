//! Page panels: layer toggles with legends, category checkboxes, the date
//! slider and the date range inputs. Elements missing from the page are
//! skipped.

use viewer::Viewer;
use viewer::controls::{ALL_CATEGORIES_ID, CategoryChecklist};
use viewer::interaction::escape_html;
use viewer::slider::{DateRangeUpdate, DateSlider};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement};

const LAYER_PANEL: &str = "layerButtons";
const CATEGORY_PANEL: &str = "category-filters";
const SLIDER: &str = "dateSlider";
const SLIDER_LABEL: &str = "sliderDateLabel";
const PLAY_BUTTON: &str = "playButton";
const START_DATE: &str = "startDate";
const END_DATE: &str = "endDate";

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn input(doc: &Document, id: &str) -> Option<HtmlInputElement> {
    doc.get_element_by_id(id)?.dyn_into().ok()
}

fn listen(
    target: &Element,
    kind: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let handler = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    target.add_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())?;
    // Panels live as long as the page.
    handler.forget();
    Ok(())
}

/// `<label class="chicboxes">text<input type="checkbox"><span class="checkmark"></label>`
fn checkbox(
    doc: &Document,
    text: &str,
    id: &str,
    checked: bool,
) -> Result<(Element, HtmlInputElement), JsValue> {
    let label = doc.create_element("label")?;
    label.set_class_name("chicboxes");
    label.set_inner_html(&escape_html(text));
    let input: HtmlInputElement = doc.create_element("input")?.dyn_into()?;
    input.set_type("checkbox");
    input.set_id(id);
    input.set_checked(checked);
    let span = doc.create_element("span")?;
    span.set_class_name("checkmark");
    label.append_child(&input)?;
    label.append_child(&span)?;
    Ok((label, input))
}

pub fn build_panels(viewer: &Viewer) -> Result<(), JsValue> {
    let doc = document()?;

    if let Some(panel) = doc.get_element_by_id(LAYER_PANEL) {
        for toggle in viewer.layer_toggles() {
            let (label, input) =
                checkbox(&doc, &toggle.label, &toggle.checkbox_id, toggle.checked)?;
            let id = toggle.checkbox_id.clone();
            let source = input.clone();
            listen(&input, "change", move |_| crate::set_layer_visible(&id, source.checked()))?;
            panel.append_child(&label)?;
            panel.insert_adjacent_html("beforeend", &toggle.legend.to_html())?;
            let br = doc.create_element("br")?;
            panel.append_child(&br)?;
        }
    }

    if let Some(panel) = doc.get_element_by_id(CATEGORY_PANEL) {
        let (all, _) = checkbox(&doc, "All", ALL_CATEGORIES_ID, true)?;
        panel.append_child(&all)?;
        for (category, checked) in viewer.categories().categories() {
            let (label, _) = checkbox(&doc, category, category, checked)?;
            panel.append_child(&label)?;
        }
        listen(&panel, "change", |event| {
            let Some(target) = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            crate::toggle_category(&target.id(), target.checked());
        })?;
    }

    if let Some(slider) = input(&doc, SLIDER) {
        slider.set_min("0");
        slider.set_max(&viewer.slider().max_value().to_string());
        let source = slider.clone();
        listen(&slider, "input", move |_| {
            if let Ok(value) = source.value().parse::<u32>() {
                crate::set_slider_value(value);
            }
        })?;
    }
    if let Some(button) = doc.get_element_by_id(PLAY_BUTTON) {
        listen(&button, "click", |_| crate::play_slider())?;
    }
    show_slider(viewer.slider());

    if let (Some(start), Some(end)) = (input(&doc, START_DATE), input(&doc, END_DATE)) {
        for target in [&start, &end] {
            let (start, end) = (start.clone(), end.clone());
            listen(target, "change", move |_| {
                crate::set_date_range(&start.value(), &end.value())
            })?;
        }
    }
    Ok(())
}

/// Flips `class` on every panel; the toggle element then shows `opened` or
/// `closed` depending on the first panel.
pub fn toggle_panels(
    panel_ids: &[String],
    toggle_id: &str,
    opened: &str,
    closed: &str,
    class: &str,
) -> Result<(), JsValue> {
    let doc = document()?;
    let panels: Vec<Element> = panel_ids
        .iter()
        .filter_map(|id| doc.get_element_by_id(id))
        .collect();
    for panel in &panels {
        panel.class_list().toggle(class)?;
    }
    let Some(first) = panels.first() else {
        return Ok(());
    };
    if let Some(toggle) = doc.get_element_by_id(toggle_id) {
        let text = if first.class_list().contains(class) { opened } else { closed };
        toggle.set_inner_html(text);
    }
    Ok(())
}

pub fn show_categories(checklist: &CategoryChecklist) {
    let Ok(doc) = document() else { return };
    for (category, checked) in checklist.categories() {
        if let Some(input) = input(&doc, category) {
            input.set_checked(checked);
        }
    }
    if let Some(all) = input(&doc, ALL_CATEGORIES_ID) {
        all.set_checked(checklist.all_checked());
    }
}

pub fn show_slider(slider: &DateSlider) {
    let Ok(doc) = document() else { return };
    if let Some(input) = input(&doc, SLIDER) {
        input.set_value(&slider.value().to_string());
    }
    if let Some(label) = doc.get_element_by_id(SLIDER_LABEL) {
        label.set_inner_html(&slider.label());
    }
    if let Some(button) = doc
        .get_element_by_id(PLAY_BUTTON)
        .and_then(|b| b.dyn_into::<HtmlButtonElement>().ok())
    {
        button.set_disabled(!slider.play_enabled());
    }
}

pub fn show_date_range(update: &DateRangeUpdate) {
    let Ok(doc) = document() else { return };
    if let Some(start) = input(&doc, START_DATE) {
        start.set_value(&update.start);
    }
    if let Some(end) = input(&doc, END_DATE) {
        end.set_min(&update.end_min);
        end.set_value(&update.end);
    }
}
