// src/classifier.rs
//
// Classifier boundary. The control loop consumes this as a function from
// raw JPEG bytes to a predicted class; the ONNX session below is the
// production path. Per-frame failures (truncated JPEG, inference error)
// degrade to NoDetection and never cross into the loop.

use crate::command::PredictedClass;
use crate::types::ModelConfig;
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use ndarray::{Array, IxDyn};
use ort::{GraphOptimizationLevel, Session};
use tracing::{debug, info};

/// Unusable input (a truncated or corrupt JPEG) is not an error: it
/// yields `NoDetection` like any other frame without a signal. An `Err`
/// means the classifier itself malfunctioned; the loop skips that cycle.
pub trait Classifier {
    fn classify(&mut self, jpeg: &[u8]) -> Result<PredictedClass>;
}

pub struct OnnxClassifier {
    session: Session,
    input_width: usize,
    input_height: usize,
}

impl OnnxClassifier {
    /// Loading the model is the only fallible step; a missing or broken
    /// model file aborts startup.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        info!("Model path: {}", config.path);
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.path)
            .context("Failed to load model")?;

        Ok(Self {
            session,
            input_width: config.input_width,
            input_height: config.input_height,
        })
    }

    fn infer(&self, input: Vec<f32>) -> Result<Vec<f32>> {
        let input_shape = vec![1, 3, self.input_height, self.input_width];
        let input_array = Array::from_shape_vec(IxDyn(&input_shape), input)
            .context("Failed to create input array")?;

        let outputs = self
            .session
            .run(ort::inputs![input_array]?)
            .context("Inference failed")?;

        let output = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract output tensor")?;
        let output_view = output.view();
        let output_slice = output_view
            .as_slice()
            .context("Failed to get output slice")?;

        Ok(output_slice.to_vec())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&mut self, jpeg: &[u8]) -> Result<PredictedClass> {
        let input = match preprocess(jpeg, self.input_width, self.input_height) {
            Ok(input) => input,
            Err(e) => {
                debug!("Photo unusable for classification: {e}");
                return Ok(PredictedClass::NoDetection);
            }
        };
        let logits = self.infer(input)?;
        let index = argmax(&logits).ok_or_else(|| anyhow!("Model produced no output"))?;
        Ok(PredictedClass::from_index(index))
    }
}

/// Decode a JPEG, resize to the model input, normalize to CHW layout.
pub fn preprocess(jpeg: &[u8], dst_width: usize, dst_height: usize) -> Result<Vec<f32>> {
    const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const STD: [f32; 3] = [0.229, 0.224, 0.225];

    let decoded = image::load_from_memory(jpeg).context("Failed to decode photo")?;
    let resized = image::imageops::resize(
        &decoded.to_rgb8(),
        dst_width as u32,
        dst_height as u32,
        FilterType::Triangle,
    );

    let mut output = vec![0.0f32; 3 * dst_height * dst_width];
    for c in 0..3 {
        for h in 0..dst_height {
            for w in 0..dst_width {
                let pixel = resized.get_pixel(w as u32, h as u32)[c] as f32 / 255.0;
                output[c * dst_height * dst_width + h * dst_width + w] =
                    (pixel - MEAN[c]) / STD[c];
            }
        }
    }

    Ok(output)
}

fn argmax(logits: &[f32]) -> Option<usize> {
    logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, _)| index)
}
