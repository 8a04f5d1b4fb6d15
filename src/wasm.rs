//! WebAssembly bindings for pixel-mosaic

use crate::palette::Palette;
use crate::quantize::{quantize, TargetSize};
use image::RgbaImage;
use wasm_bindgen::prelude::*;
use web_sys::console;

#[wasm_bindgen]
pub struct WasmConverter {
    size: Option<TargetSize>,
    palette: Palette,
}

#[wasm_bindgen]
impl WasmConverter {
    /// Create a converter with the built-in palette and no grid size yet.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmConverter {
        WasmConverter { size: None, palette: Palette::default() }
    }

    /// Set the grid size from a "WxH" string such as "60x80".
    #[wasm_bindgen]
    pub fn set_size(&mut self, size: &str) -> Result<(), JsValue> {
        let size = size.parse::<TargetSize>().map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.size = Some(size);
        Ok(())
    }

    /// Replace the palette with a JSON array of `{rgb, label, code}` entries.
    #[wasm_bindgen]
    pub fn set_palette_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.palette = Palette::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Pixelate canvas RGBA data.
    ///
    /// Returns `undefined` when there is nothing to do (no size set, empty
    /// image, or blocks smaller than 2px), so the page keeps its current
    /// image. Throws when the grid is too large to allocate. Otherwise
    /// returns `{ data, width, height, factor, legend }`
    /// where `data` is RGBA ready for `new ImageData(...)`.
    #[wasm_bindgen]
    pub fn pixelate(&self, image_data: &[u8], width: u32, height: u32) -> Result<JsValue, JsValue> {
        let Some(size) = self.size else {
            return Ok(JsValue::UNDEFINED);
        };
        let img = RgbaImage::from_raw(width, height, image_data.to_vec())
            .ok_or_else(|| JsValue::from_str("Invalid image dimensions"))?;

        let quantized = quantize(&img, size, &self.palette).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let Some(quantized) = quantized else {
            return Ok(JsValue::UNDEFINED);
        };
        console::log_1(&format!("block factor {}", quantized.factor).into());

        let legend = js_sys::Object::new();
        for (rgb, count) in quantized.histogram.iter() {
            js_sys::Reflect::set(&legend, &rgb.to_string().into(), &(count as f64).into())?;
        }
        console::log_1(&legend);

        let (out_w, out_h) = quantized.image.dimensions();
        let data = js_sys::Uint8ClampedArray::from(quantized.image.as_raw().as_slice());

        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"data".into(), &data)?;
        js_sys::Reflect::set(&result, &"width".into(), &out_w.into())?;
        js_sys::Reflect::set(&result, &"height".into(), &out_h.into())?;
        js_sys::Reflect::set(&result, &"factor".into(), &quantized.factor.into())?;
        js_sys::Reflect::set(&result, &"legend".into(), &legend)?;

        Ok(result.into())
    }
}

impl Default for WasmConverter {
    fn default() -> Self {
        Self::new()
    }
}
