#![cfg(target_arch = "wasm32")]

use crate::engine::{Engine, ScenarioInfo, scenario_catalog};
use crate::models::pasture::PastureConfig;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn available_scenarios() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in scenario_catalog() {
        out.push(&scenario_info_to_js(info));
    }
    out
}

#[wasm_bindgen]
pub fn pasture_defaults() -> JsValue {
    let config = PastureConfig::default();
    serde_wasm_bindgen::to_value(&config).unwrap_or(JsValue::NULL)
}

fn scenario_info_to_js(info: &ScenarioInfo) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(info.id));
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(info.name));
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("description"),
        &JsValue::from_str(info.description),
    );
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("sheep"),
        &JsValue::from(info.sheep as u32),
    );
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("wolves"),
        &JsValue::from(info.wolves as u32),
    );
    JsValue::from(obj)
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmPasture {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmPasture {
    /// `seed` defaults to the current time.
    #[wasm_bindgen(constructor)]
    pub fn new(scenario_id: &str, seed: Option<f64>) -> Result<WasmPasture, JsValue> {
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        let engine = Engine::new_builtin(scenario_id, seed).map_err(to_js)?;
        Ok(WasmPasture { engine })
    }

    /// Build from `{ sheep?, wolves?, width?, height?, seed? }`.
    #[wasm_bindgen(js_name = "newFromConfig")]
    pub fn new_from_config(config: JsValue) -> Result<WasmPasture, JsValue> {
        let config: PastureConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        let engine = Engine::from_config(&config).map_err(to_js)?;
        Ok(WasmPasture { engine })
    }

    pub fn len(&self) -> usize { self.engine.len() }

    pub fn tick(&mut self) { self.engine.tick(); }

    #[wasm_bindgen(js_name = "tickCount")]
    pub fn tick_count(&self) -> f64 { self.engine.tick_count() as f64 }

    /// Flat `[x, y, angle, width, classCode]` per agent.
    pub fn agents(&self) -> Vec<f32> { self.engine.agents_flat() }

    /// Flat `[x, y, activated]` per sensor.
    pub fn sensors(&self) -> Vec<f32> { self.engine.sensors_flat() }

    /// `{ [classTag]: count }`.
    pub fn census(&self) -> JsValue {
        let obj = js_sys::Object::new();
        for (class, count) in self.engine.census() {
            let _ = js_sys::Reflect::set(
                &obj,
                &JsValue::from_str(&class),
                &JsValue::from(count as u32),
            );
        }
        JsValue::from(obj)
    }

    #[wasm_bindgen(js_name = "setPointer")]
    pub fn set_pointer(&mut self, x: f64, y: f64) { self.engine.set_pointer(x, y); }

    #[wasm_bindgen(js_name = "clearPointer")]
    pub fn clear_pointer(&mut self) { self.engine.clear_pointer(); }
}
