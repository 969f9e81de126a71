//! DOM（web-sys）との接続
//!
//! 対象要素が見つからない場合は何もしない。

use crate::alerts::Dismissible;
use crate::config::PageConfig;
use crate::error::{GlueError, Result};
use crate::reveal::RevealTarget;
use crate::theme::{Theme, ThemeSurface, Transformable};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// セレクタに一致する全要素
pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_one(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}

// ============================================
// テーマ
// ============================================

pub struct DomThemeSurface {
    attribute: String,
    icon_selector: String,
}

impl DomThemeSurface {
    pub fn new(config: &PageConfig) -> Self {
        DomThemeSurface {
            attribute: config.theme_attribute.clone(),
            icon_selector: config.theme_icon_selector.clone(),
        }
    }
}

impl ThemeSurface for DomThemeSurface {
    fn apply_theme_attribute(&self, theme: Theme) {
        if let Some(root) = document().and_then(|d| d.document_element()) {
            let _ = root.set_attribute(&self.attribute, theme.as_str());
        }
    }

    fn set_toggle_icon(&self, class: &str) {
        if let Some(icon) = document().and_then(|d| query_one(&d, &self.icon_selector)) {
            icon.set_class_name(class);
        }
    }
}

impl Transformable for HtmlElement {
    fn set_transform(&self, value: &str) {
        let _ = self.style().set_property("transform", value);
    }
}

// ============================================
// アラート（Bootstrap）
// ============================================

pub struct BootstrapAlert {
    element: Element,
}

impl BootstrapAlert {
    pub fn new(element: Element) -> Self {
        BootstrapAlert { element }
    }
}

fn get_function(target: &JsValue, name: &str) -> Result<js_sys::Function> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .map_err(|e| GlueError::js(&e))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| GlueError::Js(format!("{}が関数ではありません", name)))
}

impl Dismissible for BootstrapAlert {
    fn dismiss(&self) -> Result<()> {
        // 既にユーザーが閉じている
        if !self.element.is_connected() {
            return Ok(());
        }

        let window = web_sys::window().ok_or_else(|| GlueError::Js("windowがありません".to_string()))?;
        let alert_class = js_sys::Reflect::get(&window, &JsValue::from_str("bootstrap"))
            .ok()
            .filter(|b| b.is_object())
            .and_then(|b| js_sys::Reflect::get(&b, &JsValue::from_str("Alert")).ok())
            .filter(|a| a.is_function())
            .ok_or_else(|| GlueError::Js("bootstrap.Alertが見つかりません".to_string()))?;

        let get_instance = get_function(&alert_class, "getOrCreateInstance")?;
        let instance = get_instance
            .call1(&alert_class, &self.element)
            .map_err(|e| GlueError::js(&e))?;
        get_function(&instance, "close")?
            .call0(&instance)
            .map_err(|e| GlueError::js(&e))?;
        Ok(())
    }
}

// ============================================
// カード
// ============================================

impl RevealTarget for Element {
    fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        let _ = self.class_list().add_1(class);
    }
}
