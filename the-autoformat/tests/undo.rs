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

fn model_with(data: &str) -> Model {
  let mut model = Model::new();
  model
    .commands_mut()
    .add("bulletedList", BlockCommand::new("listItem").with_attribute("listType", "bulleted"));
  model.commands_mut().add("bold", AttributeCommand::new("bold"));
  markup::set_data(&mut model, data).unwrap();

  let mut autoformat = Autoformat::from_config(&AutoformatConfig::default()).unwrap();
  autoformat
    .block_rule(r"^- $", "bulletedList")
    .unwrap()
    .inline_rule(r"(\*\*)([^*]+)(\*\*)$", "bold")
    .unwrap();
  autoformat.attach(&mut model);
  model
}

#[test]
fn test_undo_restores_typed_trigger() {
  let mut model = model_with("<paragraph>-[]</paragraph>");
  model.input_text(" ").unwrap();
  assert_eq!(
    markup::get_data(&model),
    r#"<listItem listType="bulleted">[]</listItem>"#
  );

  assert!(model.undo().unwrap());
  assert_eq!(markup::get_data(&model), "<paragraph>- []</paragraph>");

  assert!(model.undo().unwrap());
  assert_eq!(markup::get_data(&model), "<paragraph>-[]</paragraph>");

  assert!(model.redo().unwrap());
  assert_eq!(markup::get_data(&model), "<paragraph>- []</paragraph>");
  assert!(model.redo().unwrap());
  assert_eq!(
    markup::get_data(&model),
    r#"<listItem listType="bulleted">[]</listItem>"#
  );
}

#[test]
fn test_undo_inline_and_transformation() {
  let mut model = model_with("<paragraph>**a*[]</paragraph>");
  model.input_text("*").unwrap();
  assert_eq!(
    markup::get_data(&model),
    r#"<paragraph><$text bold="true">a</$text>[]</paragraph>"#
  );
  model.undo().unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>**a**[]</paragraph>");

  let mut model = model_with("<paragraph>x --[]</paragraph>");
  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>x \u{2013} []</paragraph>");
  model.undo().unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>x -- []</paragraph>");
}

#[test]
fn test_replayed_history_does_not_retrigger() {
  let mut model = model_with("<paragraph>x --[]</paragraph>");
  model.input_text(" ").unwrap();
  model.undo().unwrap();
  model.undo().unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>x --[]</paragraph>");

  model.redo().unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>x -- []</paragraph>");
  assert_eq!(model.history().len(), 3);
}
