mod rig_llm;

pub use rig_llm::RigLlm;
