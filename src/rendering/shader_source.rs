//! WGSL shader blobs as the renderer sees them: parsed with naga to find the
//! entry point for a stage and the vertex inputs an input layout has to feed.

use std::collections::BTreeMap;

use naga::{Binding, Module, Scalar, ScalarKind, TypeInner, VectorSize};

use crate::rendering::{
    context::{ElementFormat, InputElement, ShaderStage},
    error::{ErrorCode, GraphicsError},
};

pub struct ShaderSource<'a> {
    pub text: &'a str,
    module: Module,
}

impl<'a> ShaderSource<'a> {
    pub fn parse(label: &str, bytecode: &'a [u8]) -> Result<Self, GraphicsError> {
        let text = std::str::from_utf8(bytecode).map_err(|e| {
            GraphicsError::resource(
                ErrorCode::Validation,
                format!("{label}: shader source is not valid UTF-8 ({e})"),
            )
        })?;

        let module = naga::front::wgsl::parse_str(text).map_err(|e| {
            GraphicsError::resource(ErrorCode::Validation, format!("{label}: failed to parse WGSL"))
                .with_info([e.emit_to_string(text)])
        })?;

        Ok(Self { text, module })
    }

    /// Name of the first entry point for `stage`.
    pub fn entry_point(&self, stage: ShaderStage) -> Option<&str> {
        let wanted = match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        };
        self.module
            .entry_points
            .iter()
            .find(|entry| entry.stage == wanted)
            .map(|entry| entry.name.as_str())
    }

    /// Format of every `@location` the vertex entry point reads. `None` marks an
    /// input no vertex element can feed.
    pub fn vertex_inputs(&self) -> Result<BTreeMap<u32, Option<ElementFormat>>, GraphicsError> {
        let entry = self
            .module
            .entry_points
            .iter()
            .find(|entry| entry.stage == naga::ShaderStage::Vertex)
            .ok_or_else(|| {
                GraphicsError::resource(ErrorCode::Validation, "Shader has no vertex entry point")
            })?;

        let mut inputs = BTreeMap::new();
        for argument in &entry.function.arguments {
            match &argument.binding {
                Some(binding) => self.record_input(&mut inputs, binding, argument.ty),
                // Inputs grouped in a struct carry their bindings on the members.
                None => {
                    if let TypeInner::Struct { members, .. } = &self.module.types[argument.ty].inner {
                        for member in members {
                            if let Some(binding) = &member.binding {
                                self.record_input(&mut inputs, binding, member.ty);
                            }
                        }
                    }
                }
            }
        }
        Ok(inputs)
    }

    fn record_input(
        &self,
        inputs: &mut BTreeMap<u32, Option<ElementFormat>>,
        binding: &Binding,
        ty: naga::Handle<naga::Type>,
    ) {
        if let Binding::Location { location, .. } = binding {
            inputs.insert(*location, element_format(&self.module.types[ty].inner));
        }
    }

    /// Checks that the n-th element feeds `@location(n)` with the format it declares,
    /// and that every location the shader reads is fed.
    pub fn validate_input_layout(&self, elements: &[InputElement]) -> Result<(), GraphicsError> {
        let inputs = self.vertex_inputs()?;
        let mut problems = Vec::new();

        for (location, element) in elements.iter().enumerate() {
            let name = format!("{}{}", element.semantic, element.semantic_index);
            match inputs.get(&(location as u32)) {
                None => problems.push(format!(
                    "{name} feeds @location({location}), which the vertex shader does not read"
                )),
                Some(None) => problems.push(format!(
                    "@location({location}) has a type no vertex element can feed"
                )),
                Some(Some(expected)) if *expected != element.format => problems.push(format!(
                    "{name} is {:?} but @location({location}) expects {expected:?}",
                    element.format
                )),
                Some(Some(_)) => {}
            }
        }
        for &location in inputs.keys() {
            if location as usize >= elements.len() {
                problems.push(format!("@location({location}) is not fed by the input layout"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(GraphicsError::resource(
                ErrorCode::Validation,
                "Input layout does not match the vertex shader input signature",
            )
            .with_info(problems))
        }
    }
}

fn element_format(inner: &TypeInner) -> Option<ElementFormat> {
    match *inner {
        TypeInner::Scalar(Scalar {
            kind: ScalarKind::Float,
            width: 4,
        }) => Some(ElementFormat::Float32),
        TypeInner::Scalar(Scalar {
            kind: ScalarKind::Uint,
            width: 4,
        }) => Some(ElementFormat::Uint32),
        TypeInner::Vector {
            size,
            scalar:
                Scalar {
                    kind: ScalarKind::Float,
                    width: 4,
                },
        } => Some(match size {
            VectorSize::Bi => ElementFormat::Float32x2,
            VectorSize::Tri => ElementFormat::Float32x3,
            VectorSize::Quad => ElementFormat::Float32x4,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        struct VertexInput {
            @location(0) position: vec3<f32>,
            @location(1) weight: f32,
        }

        @vertex
        fn main_vs(input: VertexInput) -> @builtin(position) vec4<f32> {
            return vec4<f32>(input.position * input.weight, 1.0);
        }

        @fragment
        fn main_fs() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    "#;

    fn layout(weight: ElementFormat) -> [InputElement; 2] {
        [
            InputElement::per_vertex("Position", ElementFormat::Float32x3, 0),
            InputElement::per_vertex("Weight", weight, 12),
        ]
    }

    #[test]
    fn finds_entry_points_per_stage() {
        let source = ShaderSource::parse("test", VS.as_bytes()).unwrap();
        assert_eq!(source.entry_point(ShaderStage::Vertex), Some("main_vs"));
        assert_eq!(source.entry_point(ShaderStage::Pixel), Some("main_fs"));
    }

    #[test]
    fn reads_struct_member_locations() {
        let source = ShaderSource::parse("test", VS.as_bytes()).unwrap();
        let inputs = source.vertex_inputs().unwrap();
        assert_eq!(
            inputs.into_iter().collect::<Vec<_>>(),
            vec![
                (0, Some(ElementFormat::Float32x3)),
                (1, Some(ElementFormat::Float32))
            ]
        );
    }

    #[test]
    fn integer_inputs_map_to_element_formats() {
        let vs = r#"
            @vertex
            fn main(@location(0) id: u32, @location(1) cell: vec2<i32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(f32(id), f32(cell.x), 0.0, 1.0);
            }
        "#;
        let source = ShaderSource::parse("ids", vs.as_bytes()).unwrap();
        let inputs = source.vertex_inputs().unwrap();
        assert_eq!(inputs[&0], Some(ElementFormat::Uint32));
        assert_eq!(inputs[&1], None);

        let error = source
            .validate_input_layout(&[
                InputElement::per_vertex("Id", ElementFormat::Uint32, 0),
                InputElement::per_vertex("Cell", ElementFormat::Float32x2, 4),
            ])
            .unwrap_err();
        assert!(error.to_string().contains("@location(1) has a type no vertex element can feed"));
    }

    #[test]
    fn matching_layout_is_accepted() {
        let source = ShaderSource::parse("test", VS.as_bytes()).unwrap();
        assert!(source.validate_input_layout(&layout(ElementFormat::Float32)).is_ok());
    }

    #[test]
    fn format_mismatch_is_reported() {
        let source = ShaderSource::parse("test", VS.as_bytes()).unwrap();
        let error = source
            .validate_input_layout(&layout(ElementFormat::Float32x2))
            .unwrap_err();
        assert!(error.to_string().contains("Weight0 is Float32x2 but @location(1) expects Float32"));
    }

    #[test]
    fn unfed_location_is_reported() {
        let source = ShaderSource::parse("test", VS.as_bytes()).unwrap();
        let error = source
            .validate_input_layout(&layout(ElementFormat::Float32)[..1])
            .unwrap_err();
        assert!(error.to_string().contains("@location(1) is not fed"));
    }

    #[test]
    fn cube_shaders_parse() {
        let vs = std::fs::read("assets/shaders/cube_vs.wgsl").unwrap();
        let source = ShaderSource::parse("cube_vs", &vs).unwrap();
        assert!(source
            .validate_input_layout(&[InputElement::per_vertex("Position", ElementFormat::Float32x3, 0)])
            .is_ok());

        let ps = std::fs::read("assets/shaders/cube_ps.wgsl").unwrap();
        let source = ShaderSource::parse("cube_ps", &ps).unwrap();
        assert_eq!(source.entry_point(ShaderStage::Pixel), Some("fs_main"));
    }

    #[test]
    fn garbage_is_a_validation_error() {
        let error = ShaderSource::parse("bad", b"fn {").err().unwrap();
        assert_eq!(error.code(), Some(ErrorCode::Validation));
    }
}
