use the_autoformat::{
  Autoformat,
  AutoformatConfig,
  TextTransformation,
};
use the_doc::{
  batch::BatchOrigin,
  markup,
  model::Model,
  position::Range,
};

fn model_with(data: &str, transformation: TextTransformation) -> Model {
  let mut model = Model::new();
  markup::set_data(&mut model, data).unwrap();
  let mut autoformat = Autoformat::new();
  autoformat.text_transformation(transformation);
  autoformat.attach(&mut model);
  model
}

fn defaults(data: &str) -> Model {
  let config = AutoformatConfig::default();
  let transformation = TextTransformation::from_config(&config.text_transform).unwrap();
  model_with(data, transformation)
}

fn backspace(model: &mut Model) {
  let caret = model.document().selection().caret().unwrap();
  model
    .change(BatchOrigin::Local, |writer| {
      writer.remove(Range::new(caret.block, caret.offset - 1, caret.offset))
    })
    .unwrap();
}

#[test]
fn test_dashes_on_space() {
  let mut model = defaults("<paragraph>a --[]</paragraph>");
  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a \u{2013} []</paragraph>");

  let mut model = defaults("<paragraph>a ---[]</paragraph>");
  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a \u{2014} []</paragraph>");
}

#[test]
fn test_alternatives_and_other_triggers() {
  let mut model = defaults("<paragraph>hi :-[]</paragraph>");
  model.input_text(")").unwrap();
  model.input_text(",").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>hi \u{1f642},[]</paragraph>");

  let mut model = defaults("<paragraph>I love !NYC[]</paragraph>");
  model.input_text(".").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>I love New York City.[]</paragraph>");
}

#[test]
fn test_non_trigger_does_nothing() {
  let mut model = defaults("<paragraph>a --[]</paragraph>");
  model.input_text("x").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a --x[]</paragraph>");
}

#[test]
fn test_replacement_is_plain_text() {
  let transformation = TextTransformation::new([' ']).transform("\u{a9}", ["(c)"]);
  let mut model = model_with(r#"<paragraph><$text bold="true">(c)</$text>[]</paragraph>"#, transformation);

  model.input_text(" ").unwrap();
  assert_eq!(
    markup::get_data(&model),
    r#"<paragraph>©<$text bold="true"> </$text>[]</paragraph>"#
  );
}

#[test]
fn test_replaced_text_is_not_matched_again() {
  let transformation = TextTransformation::new([' '])
    .transform("->", ["-->"])
    .transform("\u{2192}", ["->"]);
  let mut model = model_with("<paragraph>a -->[]</paragraph>", transformation);

  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a -> []</paragraph>");

  backspace(&mut model);
  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a -> []</paragraph>");

  model.input_text("->").unwrap();
  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a -> \u{2192} []</paragraph>");
}

#[test]
fn test_only_local_typing_is_transformed() {
  let mut model = defaults("<paragraph>a --[]</paragraph>");
  let block = model.document().blocks()[0].id();
  model
    .change(BatchOrigin::Transparent, |writer| {
      writer.insert_text(the_doc::position::Position::new(block, 4), " ", Default::default())
    })
    .unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a -- []</paragraph>");
}

#[test]
fn test_second_engine_skips_after_document_changed() {
  let mut model = defaults("<paragraph>a --[]</paragraph>");
  let config = AutoformatConfig::default();
  let mut second = Autoformat::new();
  second.text_transformation(TextTransformation::from_config(&config.text_transform).unwrap());
  second.attach(&mut model);

  model.input_text(" ").unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a \u{2013} []</paragraph>");

  model.undo().unwrap();
  assert_eq!(markup::get_data(&model), "<paragraph>a -- []</paragraph>");
}
