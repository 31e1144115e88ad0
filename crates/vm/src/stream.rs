//! Strided external data bound to a program's inputs and outputs.
//!
//! A stream is a byte view over caller-owned memory holding one scalar per
//! instance, `byte_stride` bytes apart. The VM never owns stream memory: an
//! [`InputStream`] is only read, an [`OutputStream`] is only written.
//!
//! Register group `g` holds instances `4g..4g+4`. When the instance count is
//! not a multiple of four the last group overhangs the stream:
//!
//! - **Load** fills overhang lanes by re-reading the last real instance, so
//!   no byte past the stream's end is touched and padded lanes never carry
//!   zeros into min/max-style arithmetic.
//! - **Store** writes only the real instances; overhang lanes are dropped.

use half::f16;
use lanes_simd::Vec4f;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// Scalar encoding of a stream element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StreamDataType {
    /// 32-bit IEEE float.
    #[default]
    Float,
    /// 16-bit IEEE float, widened to `f32` on load and rounded on store.
    Half,
}

impl StreamDataType {
    /// Size in bytes of one element.
    pub fn element_size(self) -> usize {
        match self {
            StreamDataType::Float => 4,
            StreamDataType::Half => 2,
        }
    }
}

/// Bytes a stream needs to hold `instance_count` elements.
///
/// Returns `None` when the size does not fit in `usize`.
pub fn required_bytes(
    byte_stride: usize,
    data_type: StreamDataType,
    instance_count: usize,
) -> Option<usize> {
    if instance_count == 0 {
        return Some(0);
    }
    byte_stride
        .checked_mul(instance_count - 1)?
        .checked_add(data_type.element_size())
}

fn validate_layout(
    name: &str,
    len: usize,
    byte_stride: usize,
    data_type: StreamDataType,
    instance_count: usize,
) -> Result<(), ExecutionError> {
    let element_size = data_type.element_size();
    if byte_stride < element_size {
        return Err(ExecutionError::InvalidStride {
            name: name.to_string(),
            stride: byte_stride,
            element_size,
        });
    }
    // An unrepresentable size can never be satisfied.
    let required = required_bytes(byte_stride, data_type, instance_count).unwrap_or(usize::MAX);
    if len < required {
        return Err(ExecutionError::StreamTooSmall {
            name: name.to_string(),
            required,
            actual: len,
        });
    }
    Ok(())
}

#[inline]
fn read_element(data: &[u8], offset: usize, data_type: StreamDataType) -> f32 {
    match data_type {
        StreamDataType::Float => bytemuck::pod_read_unaligned::<f32>(&data[offset..offset + 4]),
        StreamDataType::Half => {
            f16::from_bits(bytemuck::pod_read_unaligned::<u16>(&data[offset..offset + 2])).to_f32()
        }
    }
}

#[inline]
fn write_element(data: &mut [u8], offset: usize, data_type: StreamDataType, value: f32) {
    match data_type {
        StreamDataType::Float => data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes()),
        StreamDataType::Half => {
            data[offset..offset + 2].copy_from_slice(&f16::from_f32(value).to_bits().to_ne_bytes())
        }
    }
}

/// A named, read-only strided view over per-instance input data.
#[derive(Debug, Clone, Copy)]
pub struct InputStream<'a> {
    name: &'a str,
    data: &'a [u8],
    byte_stride: usize,
    data_type: StreamDataType,
}

impl<'a> InputStream<'a> {
    /// Creates a stream over `data` with one element every `byte_stride` bytes.
    pub fn new(name: &'a str, data: &'a [u8], byte_stride: usize, data_type: StreamDataType) -> Self {
        Self {
            name,
            data,
            byte_stride,
            data_type,
        }
    }

    /// Tightly packed `f32` values.
    pub fn from_f32(name: &'a str, values: &'a [f32]) -> Self {
        Self::new(name, bytemuck::cast_slice(values), 4, StreamDataType::Float)
    }

    /// Tightly packed half-precision values.
    pub fn from_f16(name: &'a str, values: &'a [f16]) -> Self {
        Self::new(name, bytemuck::cast_slice(values), 2, StreamDataType::Half)
    }

    /// Name matched against the program's input names.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Distance in bytes between consecutive instances.
    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    /// Total bytes in the underlying view.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Element encoding.
    pub fn data_type(&self) -> StreamDataType {
        self.data_type
    }

    /// Checks stride and size against `instance_count`.
    pub fn validate(&self, instance_count: usize) -> Result<(), ExecutionError> {
        validate_layout(
            self.name,
            self.data.len(),
            self.byte_stride,
            self.data_type,
            instance_count,
        )
    }

    /// Reads instance `index`.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the stream.
    pub fn read(&self, index: usize) -> f32 {
        read_element(self.data, index * self.byte_stride, self.data_type)
    }

    /// View starting at instance `first`, used to hand disjoint instance
    /// ranges to parallel workers.
    pub(crate) fn skip_instances(&self, first: usize) -> Self {
        let start = (first * self.byte_stride).min(self.data.len());
        Self {
            data: &self.data[start..],
            ..*self
        }
    }

    /// Fills `run` (one register per group of four instances) from the
    /// stream. Overhang lanes repeat instance `instance_count - 1`.
    ///
    /// The stream must already have passed [`validate`](Self::validate).
    pub fn load(&self, run: &mut [Vec4f], instance_count: usize) {
        if instance_count == 0 {
            return;
        }
        let last = instance_count - 1;
        let full_groups = (instance_count / 4).min(run.len());

        let packed = if self.data_type == StreamDataType::Float && self.byte_stride == 4 {
            bytemuck::try_cast_slice::<u8, f32>(self.data).ok()
        } else {
            None
        };

        match packed {
            Some(values) => {
                let lanes: &mut [f32] = bytemuck::cast_slice_mut(&mut run[..full_groups]);
                lanes.copy_from_slice(&values[..full_groups * 4]);
            }
            None => {
                for (group, register) in run[..full_groups].iter_mut().enumerate() {
                    let base = group * 4;
                    *register = Vec4f::new(
                        self.read(base),
                        self.read(base + 1),
                        self.read(base + 2),
                        self.read(base + 3),
                    );
                }
            }
        }

        for (group, register) in run.iter_mut().enumerate().skip(full_groups) {
            let base = group * 4;
            *register = Vec4f::from_array(std::array::from_fn(|lane| self.read((base + lane).min(last))));
        }
    }
}

/// A named, write-only strided view over per-instance output data.
#[derive(Debug)]
pub struct OutputStream<'a> {
    name: &'a str,
    data: &'a mut [u8],
    byte_stride: usize,
    data_type: StreamDataType,
}

impl<'a> OutputStream<'a> {
    /// Creates a stream over `data` with one element every `byte_stride` bytes.
    pub fn new(
        name: &'a str,
        data: &'a mut [u8],
        byte_stride: usize,
        data_type: StreamDataType,
    ) -> Self {
        Self {
            name,
            data,
            byte_stride,
            data_type,
        }
    }

    /// Tightly packed `f32` values.
    pub fn from_f32(name: &'a str, values: &'a mut [f32]) -> Self {
        Self::new(name, bytemuck::cast_slice_mut(values), 4, StreamDataType::Float)
    }

    /// Tightly packed half-precision values.
    pub fn from_f16(name: &'a str, values: &'a mut [f16]) -> Self {
        Self::new(name, bytemuck::cast_slice_mut(values), 2, StreamDataType::Half)
    }

    /// Name matched against the program's output names.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Distance in bytes between consecutive instances.
    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    /// Total bytes in the underlying view.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Element encoding.
    pub fn data_type(&self) -> StreamDataType {
        self.data_type
    }

    /// Checks stride and size against `instance_count`.
    pub fn validate(&self, instance_count: usize) -> Result<(), ExecutionError> {
        validate_layout(
            self.name,
            self.data.len(),
            self.byte_stride,
            self.data_type,
            instance_count,
        )
    }

    /// Writes instance `index`.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the stream.
    pub fn write(&mut self, index: usize, value: f32) {
        write_element(&mut *self.data, index * self.byte_stride, self.data_type, value);
    }

    /// Splits the stream into disjoint views of `chunk_instances` instances
    /// each (the last view may be shorter).
    pub(crate) fn split_instances(&mut self, chunk_instances: usize) -> Vec<OutputStream<'_>> {
        let name = self.name;
        let byte_stride = self.byte_stride;
        let data_type = self.data_type;
        self.data
            .chunks_mut(chunk_instances * byte_stride)
            .map(|data| OutputStream {
                name,
                data,
                byte_stride,
                data_type,
            })
            .collect()
    }

    /// Writes the first `instance_count` lanes of `run` to the stream.
    ///
    /// The stream must already have passed [`validate`](Self::validate).
    pub fn store(&mut self, run: &[Vec4f], instance_count: usize) {
        let full_groups = (instance_count / 4).min(run.len());

        let packed = self.data_type == StreamDataType::Float && self.byte_stride == 4;
        let wrote_packed = packed
            && match bytemuck::try_cast_slice_mut::<u8, f32>(&mut *self.data) {
                Ok(values) => {
                    let lanes: &[f32] = bytemuck::cast_slice(&run[..full_groups]);
                    values[..full_groups * 4].copy_from_slice(lanes);
                    true
                }
                Err(_) => false,
            };

        if !wrote_packed {
            for (group, register) in run[..full_groups].iter().enumerate() {
                for (lane, value) in register.to_array().into_iter().enumerate() {
                    self.write(group * 4 + lane, value);
                }
            }
        }

        for (group, register) in run.iter().enumerate().skip(full_groups) {
            for (lane, value) in register.to_array().into_iter().enumerate() {
                let index = group * 4 + lane;
                if index >= instance_count {
                    break;
                }
                self.write(index, value);
            }
        }
    }
}
