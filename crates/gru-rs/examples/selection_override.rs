use std::sync::Arc;

use anyhow::Result;
use gru_rs::device::{ExecutionContext, HostDevice};
use gru_rs::ops::{Gru, ImplKind, Operator, SelectionOverrides};
use gru_rs::params::GruParam;
use gru_rs::tensor::TensorDescriptor;
use serde_json::json;

const WORD: usize = 16;
const HIDDEN: usize = 32;

fn main() -> Result<()> {
    env_logger::init();

    let device = Arc::new(HostDevice::new());
    let ctx = ExecutionContext::new(Arc::clone(&device));

    // The host device has no vendor library, so steer selection to the generic kernel.
    let overrides: SelectionOverrides = serde_json::from_value(json!({
        "gru": "prefer=generic"
    }))?;
    let mut gru = Gru::<HostDevice>::from_overrides(&overrides);

    let param = GruParam::new(TensorDescriptor::vector(3 * HIDDEN)).with_weights(
        TensorDescriptor::vector(WORD * HIDDEN * 3),
        TensorDescriptor::vector(HIDDEN * HIDDEN * 3),
    );

    let mut output = TensorDescriptor::default();
    gru.compute_output_shape(&[], &mut [&mut output], &param)?;
    println!("speculative output shape: {}", output.shape());

    gru.register_implementation(ImplKind::Vendor)?;
    gru.register_implementation(ImplKind::Generic)?;
    gru.select_static()?;
    println!(
        "candidates {:?}, active {:?}",
        gru.implementation_kinds(),
        gru.active_kind()
    );

    let input = TensorDescriptor::nchw(120, WORD, 1, 1);
    gru.execute(&[&input], &[&output], &param, &ctx)?;
    println!("host launches: {}", device.launch_count());

    Ok(())
}
