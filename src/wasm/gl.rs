use crate::error::VizError;
use crate::mesh::{Mesh, Primitive};
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

const VERTEX_SHADER: &str = r#"#version 300 es
uniform mat4 u_projection;
uniform mat4 u_view;
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;
out vec4 v_color;
void main() {
    v_color = a_color;
    gl_Position = u_projection * u_view * vec4(a_position, 1.0);
    gl_PointSize = 2.0;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec4 v_color;
out vec4 out_color;
void main() {
    out_color = v_color;
}
"#;

const POSITION: u32 = 0;
const COLOR: u32 = 1;

/// Draws `Mesh` batches with a single flat-colour program.
pub struct GlRenderer {
    gl: GL,
    canvas: HtmlCanvasElement,
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    positions: WebGlBuffer,
    colors: WebGlBuffer,
    u_projection: Option<WebGlUniformLocation>,
    u_view: Option<WebGlUniformLocation>,
}

impl GlRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, VizError> {
        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or(VizError::ContextUnavailable("WebGL2"))?
            .dyn_into()
            .map_err(|_| VizError::ContextUnavailable("WebGL2"))?;

        let vs = compile(&gl, GL::VERTEX_SHADER, VERTEX_SHADER)?;
        let fs = compile(&gl, GL::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link(&gl, &vs, &fs)?;
        gl.delete_shader(Some(&vs));
        gl.delete_shader(Some(&fs));

        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| VizError::Js("createVertexArray returned null".into()))?;
        let positions = gl
            .create_buffer()
            .ok_or_else(|| VizError::Js("createBuffer returned null".into()))?;
        let colors = gl
            .create_buffer()
            .ok_or_else(|| VizError::Js("createBuffer returned null".into()))?;

        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&positions));
        gl.enable_vertex_attrib_array(POSITION);
        gl.vertex_attrib_pointer_with_i32(POSITION, 3, GL::FLOAT, false, 0, 0);
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&colors));
        gl.enable_vertex_attrib_array(COLOR);
        gl.vertex_attrib_pointer_with_i32(COLOR, 4, GL::FLOAT, false, 0, 0);
        gl.bind_vertex_array(None);

        let u_projection = gl.get_uniform_location(&program, "u_projection");
        let u_view = gl.get_uniform_location(&program, "u_view");

        Ok(Self {
            gl,
            canvas: canvas.clone(),
            program,
            vao,
            positions,
            colors,
            u_projection,
            u_view,
        })
    }

    pub fn draw(&self, mesh: &Mesh) {
        let gl = &self.gl;
        gl.viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        let [r, g, b, a] = mesh.clear;
        gl.clear_color(r, g, b, a);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);

        gl.use_program(Some(&self.program));
        gl.uniform_matrix4fv_with_f32_array(
            self.u_projection.as_ref(),
            false,
            &mesh.projection.to_cols_array(),
        );
        gl.uniform_matrix4fv_with_f32_array(self.u_view.as_ref(), false, &mesh.view.to_cols_array());

        gl.bind_vertex_array(Some(&self.vao));
        for batch in mesh.batches.iter().filter(|b| !b.is_empty()) {
            self.upload(&self.positions, &batch.positions);
            self.upload(&self.colors, &batch.colors);
            gl.draw_arrays(mode(batch.primitive), 0, batch.vertex_count() as i32);
        }
        gl.bind_vertex_array(None);
    }

    fn upload(&self, buffer: &WebGlBuffer, data: &[f32]) {
        let array = js_sys::Float32Array::from(data);
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::DYNAMIC_DRAW);
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        self.gl.delete_buffer(Some(&self.positions));
        self.gl.delete_buffer(Some(&self.colors));
        self.gl.delete_vertex_array(Some(&self.vao));
        self.gl.delete_program(Some(&self.program));
    }
}

fn mode(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => GL::TRIANGLES,
        Primitive::TriangleFan => GL::TRIANGLE_FAN,
        Primitive::Lines => GL::LINES,
        Primitive::LineLoop => GL::LINE_LOOP,
    }
}

fn compile(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, VizError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| VizError::Shader("createShader returned null".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(VizError::Shader(log))
    }
}

fn link(gl: &GL, vs: &WebGlShader, fs: &WebGlShader) -> Result<WebGlProgram, VizError> {
    let program = gl
        .create_program()
        .ok_or_else(|| VizError::Shader("createProgram returned null".into()))?;
    gl.attach_shader(&program, vs);
    gl.attach_shader(&program, fs);
    gl.link_program(&program);
    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(VizError::Shader(log))
    }
}
