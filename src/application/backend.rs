// ============================================================
// Layer 2 — Backend Selection
// ============================================================
// `--accelerator cpu|gpu` picks the Burn backend at runtime, but
// every model and batcher is generic over the backend at compile
// time. A BackendTask is a piece of work written once against a
// generic AutodiffBackend; on_accelerator instantiates it for the
// chosen backend.
//
//   cpu → Autodiff<NdArray>
//   gpu → Autodiff<Wgpu>
//
// Evaluation only needs B::InnerBackend, which shares the device.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};

use crate::domain::kinds::Accelerator;

pub type CpuBackend = Autodiff<NdArray>;
pub type GpuBackend = Autodiff<Wgpu>;

pub trait BackendTask {
    type Output;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Self::Output>;
}

pub fn on_accelerator<T: BackendTask>(accelerator: Accelerator, task: T) -> Result<T::Output> {
    match accelerator {
        Accelerator::Cpu => {
            tracing::info!("Using the NdArray (cpu) backend");
            task.run::<CpuBackend>(NdArrayDevice::default())
        }
        Accelerator::Gpu => {
            tracing::info!("Using the Wgpu (gpu) backend");
            task.run::<GpuBackend>(WgpuDevice::default())
        }
    }
}
