//! Benchmarks for the per-keystroke cost of autoformatting.
//!
//! Run with: `cargo bench -p the-autoformat --bench keystroke`

use divan::{
  Bencher,
  black_box,
};
use the_autoformat::{
  Autoformat,
  AutoformatConfig,
};
use the_doc::{
  command::{
    AttributeCommand,
    BlockCommand,
  },
  markup,
  model::Model,
};

fn main() {
  divan::main();
}

fn make_text(size: usize) -> String {
  let line = "The quick brown fox jumps over the lazy dog. ";
  let mut s = String::with_capacity(size);
  while s.len() < size {
    s.push_str(line);
  }
  s.truncate(size);
  s
}

fn make_model(size: usize, rules: bool) -> Model {
  let mut model = Model::new();
  model
    .commands_mut()
    .add("bulletedList", BlockCommand::new("listItem").with_attribute("listType", "bulleted"));
  model.commands_mut().add("bold", AttributeCommand::new("bold"));
  markup::set_data(
    &mut model,
    &format!("<paragraph>{}[]</paragraph>", make_text(size)),
  )
  .unwrap();

  if rules {
    let mut autoformat = Autoformat::from_config(&AutoformatConfig::default()).unwrap();
    autoformat
      .block_rule(r"^- $", "bulletedList")
      .unwrap()
      .inline_rule(r"(\*)([^*_]+)(\*)$", "bold")
      .unwrap()
      .inline_rule(r"(_)([^*_]+)(_)$", "italic")
      .unwrap();
    autoformat.attach(&mut model);
  }
  model
}

#[divan::bench(args = [64, 1024, 16 * 1024])]
fn type_without_autoformat(bencher: Bencher, size: usize) {
  bencher
    .with_inputs(|| make_model(size, false))
    .bench_local_values(|mut model| {
      model.input_text(black_box(" ")).unwrap();
      model
    });
}

#[divan::bench(args = [64, 1024, 16 * 1024])]
fn type_missing_every_rule(bencher: Bencher, size: usize) {
  bencher
    .with_inputs(|| make_model(size, true))
    .bench_local_values(|mut model| {
      model.input_text(black_box(" ")).unwrap();
      model
    });
}

#[divan::bench(args = [64, 1024, 16 * 1024])]
fn type_transformed_literal(bencher: Bencher, size: usize) {
  bencher
    .with_inputs(|| {
      let mut model = make_model(size, true);
      model.input_text("--").unwrap();
      model
    })
    .bench_local_values(|mut model| {
      model.input_text(black_box(" ")).unwrap();
      model
    });
}
