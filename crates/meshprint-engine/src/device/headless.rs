use std::collections::HashMap;

use glam::{Mat4, Vec4};
use meshprint_geom::{BufferHandle, PrimitiveKind, ScalarType};

use crate::capture::ClipVertex;

use super::context::{
    AttribPointer, AttribSlot, ContextTarget, GraphicsContext, ProgramHandle, ShaderHandle,
    ShaderStage, UniformValue,
};

/// Attribute state of one slot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AttribState {
    pub enabled: bool,
    pub pointer: Option<(BufferHandle, AttribPointer)>,
    /// Value read while disabled.
    pub constant: [f32; 4],
}

impl Default for AttribState {
    fn default() -> Self {
        Self { enabled: false, pointer: None, constant: [0.0, 0.0, 0.0, 1.0] }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgramInfo {
    pub attrib_locations: Vec<AttribSlot>,
    pub varyings: Vec<String>,
    pub linked: bool,
    pub uniforms: HashMap<String, UniformValue>,
}

/// One recorded `draw_arrays`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub kind: PrimitiveKind,
    pub first: usize,
    pub count: usize,
    pub program: Option<ProgramHandle>,
    /// Slots enabled at draw time, in location order.
    pub enabled: Vec<AttribSlot>,
    /// Constant values of every slot at draw time.
    pub constants: [[f32; 4]; 6],
    /// Uniforms of the bound program at draw time.
    pub uniforms: HashMap<String, UniformValue>,
    pub feedback: bool,
}

impl DrawCall {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn constant(&self, slot: AttribSlot) -> [f32; 4] {
        self.constants[slot as usize]
    }
}

/// CPU implementation of [`GraphicsContext`], the test double for a GL driver.
///
/// Stores buffers in memory and emulates transform feedback for the capture
/// program: positions go through the bound `modelViewMatrix` and
/// `projectionMatrix`, colors pass through unlit, and the clip distance is
/// `dot(clipPlane, eye)` while `useClipPlane` is set. Draws are recorded only
/// after [`recording_draws`](Self::recording_draws).
#[derive(Debug)]
pub struct HeadlessContext {
    version: String,
    target: ContextTarget,
    feedback_supported: bool,

    next_id: u32,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    deleted_buffers: Vec<BufferHandle>,
    invalidations: usize,

    attribs: [AttribState; 6],

    shaders: HashMap<ShaderHandle, ShaderStage>,
    compiled: Vec<String>,
    programs: HashMap<ProgramHandle, ProgramInfo>,
    current: Option<ProgramHandle>,

    feedback: Option<(BufferHandle, PrimitiveKind)>,
    feedback_written: usize,
    record_draws: bool,
    draws: Vec<DrawCall>,

    reject_marker: Option<String>,
    reject_feedback_links: bool,
}

impl HeadlessContext {
    /// A desktop context reporting `version`, with feedback support.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            target: ContextTarget::Desktop,
            feedback_supported: true,
            next_id: 0,
            buffers: HashMap::new(),
            deleted_buffers: Vec::new(),
            invalidations: 0,
            attribs: [AttribState::default(); 6],
            shaders: HashMap::new(),
            compiled: Vec::new(),
            programs: HashMap::new(),
            current: None,
            feedback: None,
            feedback_written: 0,
            record_draws: false,
            draws: Vec::new(),
            reject_marker: None,
            reject_feedback_links: false,
        }
    }

    /// Web targets never support feedback.
    pub fn with_target(mut self, target: ContextTarget) -> Self {
        self.target = target;
        if target == ContextTarget::Web {
            self.feedback_supported = false;
        }
        self
    }

    pub fn with_feedback(mut self, supported: bool) -> Self {
        self.feedback_supported = supported;
        self
    }

    /// Keeps a [`DrawCall`] for every draw until [`clear_draws`](Self::clear_draws).
    pub fn recording_draws(mut self) -> Self {
        self.record_draws = true;
        self
    }

    // ── failure injection ────────────────────────────────────────────────

    /// Fails compilation of any source containing `marker`.
    pub fn reject_sources_containing(&mut self, marker: impl Into<String>) {
        self.reject_marker = Some(marker.into());
    }

    /// Fails linking of every program that declares feedback varyings.
    pub fn reject_feedback_links(&mut self) {
        self.reject_feedback_links = true;
    }

    // ── inspection ───────────────────────────────────────────────────────

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Every delete request, in order (duplicates included).
    pub fn deleted_buffers(&self) -> &[BufferHandle] {
        &self.deleted_buffers
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    pub fn attrib(&self, slot: AttribSlot) -> &AttribState {
        &self.attribs[slot as usize]
    }

    pub fn program(&self, program: ProgramHandle) -> Option<&ProgramInfo> {
        self.programs.get(&program)
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current
    }

    /// Uniform value on the bound program.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.current
            .and_then(|p| self.programs.get(&p))
            .and_then(|info| info.uniforms.get(name).copied())
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Every source passed to `compile_shader`, in order.
    pub fn compiled_sources(&self) -> &[String] {
        &self.compiled
    }

    // ── internals ────────────────────────────────────────────────────────

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn current_uniforms(&self) -> HashMap<String, UniformValue> {
        self.current
            .and_then(|p| self.programs.get(&p))
            .map(|info| info.uniforms.clone())
            .unwrap_or_default()
    }

    /// Reads attribute `slot` for vertex `index` the way the vertex stage
    /// would: missing components default to `(0, 0, 0, 1)`.
    fn fetch(&self, slot: AttribSlot, index: usize) -> [f32; 4] {
        let state = &self.attribs[slot as usize];
        let (true, Some((buffer, p))) = (state.enabled, state.pointer) else {
            return state.constant;
        };
        let Some(data) = self.buffers.get(&buffer) else {
            return state.constant;
        };

        let base = p.offset + index * p.stride;
        let mut out = [0.0, 0.0, 0.0, 1.0];
        for (k, value) in out.iter_mut().enumerate().take(p.components.min(4)) {
            *value = match p.scalar {
                ScalarType::Float => {
                    let at = base + k * 4;
                    match data.get(at..at + 4) {
                        Some(bytes) => bytemuck::pod_read_unaligned::<f32>(bytes),
                        None => return state.constant,
                    }
                }
                ScalarType::UnsignedByte => match data.get(base + k) {
                    Some(&b) if p.normalized => b as f32 / 255.0,
                    Some(&b) => b as f32,
                    None => return state.constant,
                },
            };
        }
        out
    }

    fn mat4_uniform(uniforms: &HashMap<String, UniformValue>, name: &str) -> Mat4 {
        match uniforms.get(name) {
            Some(UniformValue::Mat4(m)) => Mat4::from_cols_array(m),
            _ => Mat4::IDENTITY,
        }
    }

    fn emulate_feedback(&mut self, buffer: BufferHandle, first: usize, count: usize) {
        let uniforms = self.current_uniforms();
        let model_view = Self::mat4_uniform(&uniforms, "modelViewMatrix");
        let projection = Self::mat4_uniform(&uniforms, "projectionMatrix");
        let use_clip = matches!(uniforms.get("useClipPlane"), Some(UniformValue::Int(v)) if *v != 0);
        let plane = match uniforms.get("clipPlane") {
            Some(UniformValue::Vec4(p)) => Vec4::from_array(*p),
            _ => Vec4::ZERO,
        };

        let records: Vec<ClipVertex> = (first..first + count)
            .map(|i| {
                let [x, y, z, _] = self.fetch(AttribSlot::Vertex, i);
                let eye = model_view * Vec4::new(x, y, z, 1.0);
                let clip = projection * eye;
                let distance = if use_clip { plane.dot(eye.truncate().extend(1.0)) } else { 0.0 };
                ClipVertex::new(clip.to_array(), self.fetch(AttribSlot::Color, i), distance)
            })
            .collect();

        let bytes: &[u8] = bytemuck::cast_slice(&records);
        let Some(storage) = self.buffers.get_mut(&buffer) else {
            log::warn!("feedback into unknown buffer {buffer:?}");
            return;
        };
        // Output beyond the reserved storage is dropped, as on hardware.
        let start = self.feedback_written.min(storage.len());
        let n = bytes.len().min(storage.len() - start);
        storage[start..start + n].copy_from_slice(&bytes[..n]);
        self.feedback_written += bytes.len();
    }
}

impl GraphicsContext for HeadlessContext {
    fn version_string(&self) -> String {
        self.version.clone()
    }

    fn target(&self) -> ContextTarget {
        self.target
    }

    fn supports_feedback(&self) -> bool {
        self.feedback_supported
    }

    fn create_buffer(&mut self) -> Option<BufferHandle> {
        let handle = BufferHandle::new(self.alloc_id())?;
        self.buffers.insert(handle, Vec::new());
        Some(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("delete of unknown buffer {buffer:?}");
        }
        self.deleted_buffers.push(buffer);
    }

    fn invalidate_buffer(&mut self, buffer: BufferHandle) {
        if let Some(storage) = self.buffers.get_mut(&buffer) {
            storage.clear();
            self.invalidations += 1;
        }
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        if let Some(storage) = self.buffers.get_mut(&buffer) {
            storage.clear();
            storage.extend_from_slice(data);
        }
    }

    fn reserve_buffer(&mut self, buffer: BufferHandle, size: usize) {
        if let Some(storage) = self.buffers.get_mut(&buffer) {
            storage.clear();
            storage.resize(size, 0);
        }
    }

    fn read_buffer(&mut self, buffer: BufferHandle, offset: usize, out: &mut [u8]) {
        let Some(storage) = self.buffers.get(&buffer) else { return };
        let src = storage.get(offset..).unwrap_or(&[]);
        let n = src.len().min(out.len());
        out[..n].copy_from_slice(&src[..n]);
    }

    fn enable_attrib(&mut self, slot: AttribSlot) {
        self.attribs[slot as usize].enabled = true;
    }

    fn disable_attrib(&mut self, slot: AttribSlot) {
        self.attribs[slot as usize].enabled = false;
    }

    fn attrib_pointer(&mut self, slot: AttribSlot, buffer: BufferHandle, pointer: AttribPointer) {
        self.attribs[slot as usize].pointer = Some((buffer, pointer));
    }

    fn attrib_constant(&mut self, slot: AttribSlot, value: [f32; 4]) {
        self.attribs[slot as usize].constant = value;
    }

    fn draw_arrays(&mut self, kind: PrimitiveKind, first: usize, count: usize) {
        if self.record_draws {
            let enabled = AttribSlot::ALL.into_iter().filter(|s| self.attribs[*s as usize].enabled).collect();
            self.draws.push(DrawCall {
                kind,
                first,
                count,
                program: self.current,
                enabled,
                constants: self.attribs.map(|a| a.constant),
                uniforms: self.current_uniforms(),
                feedback: self.feedback.is_some(),
            });
        }

        if let Some((buffer, fb_kind)) = self.feedback {
            if fb_kind != kind {
                log::warn!("feedback expects {fb_kind:?}, draw issued {kind:?}");
                return;
            }
            self.emulate_feedback(buffer, first, count);
        }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        self.compiled.push(source.to_owned());
        if let Some(marker) = self.reject_marker.as_deref() {
            if source.contains(marker) {
                return Err(format!("0:1(1): error: {stage} stage rejected `{marker}`"));
            }
        }
        let handle = ShaderHandle::new(self.alloc_id()).ok_or("shader id overflow")?;
        self.shaders.insert(handle, stage);
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Option<ProgramHandle> {
        let handle = ProgramHandle::new(self.alloc_id())?;
        self.programs.insert(handle, ProgramInfo::default());
        Some(handle)
    }

    fn bind_attrib_location(&mut self, program: ProgramHandle, slot: AttribSlot) {
        if let Some(info) = self.programs.get_mut(&program) {
            info.attrib_locations.push(slot);
        }
    }

    fn feedback_varyings(&mut self, program: ProgramHandle, names: &[&str]) {
        if let Some(info) = self.programs.get_mut(&program) {
            info.varyings = names.iter().map(|n| n.to_string()).collect();
        }
    }

    fn link_program(&mut self, program: ProgramHandle, shaders: &[ShaderHandle]) -> Result<(), String> {
        if let Some(missing) = shaders.iter().find(|s| !self.shaders.contains_key(*s)) {
            return Err(format!("attached shader {missing:?} does not exist"));
        }
        let reject = self.reject_feedback_links;
        let info = self.programs.get_mut(&program).ok_or("unknown program")?;
        if reject && !info.varyings.is_empty() {
            return Err("error: transform feedback varyings rejected".to_owned());
        }
        info.linked = true;
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        match self.programs.get(&program) {
            Some(info) if info.linked => self.current = Some(program),
            _ => log::warn!("use of unlinked program {program:?}"),
        }
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if let Some(info) = self.current.and_then(|p| self.programs.get_mut(&p)) {
            info.uniforms.insert(name.to_owned(), value);
        }
    }

    fn begin_feedback(&mut self, buffer: BufferHandle, kind: PrimitiveKind) {
        self.feedback = Some((buffer, kind));
        self.feedback_written = 0;
    }

    fn end_feedback(&mut self) {
        self.feedback = None;
    }
}
