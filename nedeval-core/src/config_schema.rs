use schemars::{
    gen::SchemaGenerator,
    schema::{ArrayValidation, InstanceType, RootSchema, Schema, SchemaObject},
    schema_for,
};

use crate::{metrics::MetricFactory, workspace::Configuration};

const ANY_METRIC_CONFIG: &str = "any_metric_config";

pub struct ConfigSchema {
    schema: RootSchema,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSchema {
    pub fn new() -> Self {
        let mut schema = schema_for!(Configuration);

        // Filled in by add_metric
        let mut any_metric_config = SchemaObject::default();
        any_metric_config.subschemas().one_of = Some(vec![]);

        schema.definitions.insert(
            ANY_METRIC_CONFIG.to_owned(),
            Schema::Object(any_metric_config),
        );

        // Allow $schema to be set to anything
        let mut schema_schema: SchemaObject = SchemaObject::default();
        schema_schema.string().pattern = Some(".*".to_owned());
        schema
            .schema
            .object()
            .properties
            .insert("$schema".to_owned(), schema_schema.into());

        Self { schema }
    }

    pub fn schema(&self) -> &RootSchema {
        &self.schema
    }

    pub fn add_metric(&mut self, metric_factory: &dyn MetricFactory) {
        let typename = metric_factory.typename();
        let typename_constant = SchemaObject {
            const_value: Some(typename.as_str().into()),
            ..Default::default()
        };

        let mut metric_config_schema = SchemaObject::default();
        metric_config_schema
            .object()
            .properties
            .insert("typename".to_owned(), Schema::Object(typename_constant));
        metric_config_schema
            .object()
            .required
            .insert("typename".to_owned());

        let metric_inner_schema = metric_factory.get_config_schema();
        metric_config_schema.object().properties.insert(
            "config".to_owned(),
            Schema::Object(metric_inner_schema.schema),
        );
        metric_config_schema.object().additional_properties = Some(Box::new(Schema::Bool(false)));

        self.schema
            .definitions
            .insert(typename.clone(), Schema::Object(metric_config_schema));

        if let Some(Schema::Object(any_metric_config)) =
            self.schema.definitions.get_mut(ANY_METRIC_CONFIG)
        {
            let metric_ref = SchemaObject {
                reference: Some(format!("#/definitions/{typename}")),
                ..Default::default()
            };
            any_metric_config
                .subschemas()
                .one_of
                .get_or_insert_with(Vec::new)
                .push(Schema::Object(metric_ref));
        }

        self.schema
            .definitions
            .extend(metric_inner_schema.definitions);
    }
}

pub(crate) fn gen_json_metric_configs_schema(_gen: &mut SchemaGenerator) -> Schema {
    let item = SchemaObject {
        reference: Some(format!("#/definitions/{ANY_METRIC_CONFIG}")),
        ..Default::default()
    };
    SchemaObject {
        instance_type: Some(InstanceType::Array.into()),
        array: Some(Box::new(ArrayValidation {
            items: Some(Schema::Object(item).into()),
            min_items: Some(1),
            ..Default::default()
        })),
        ..Default::default()
    }
    .into()
}
