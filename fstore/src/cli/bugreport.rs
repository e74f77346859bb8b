use bugreport::{
    bugreport,
    collector::{CompileTimeInformation, EnvironmentVariables, OperatingSystem, SoftwareVersion},
    format::Markdown,
};

pub fn run() {
    bugreport!()
        .info(SoftwareVersion::default())
        .info(OperatingSystem::default())
        .info(EnvironmentVariables::list(&[
            "SHELL",
            "TERM",
            "FSTORE_PORT",
            "FSTORE_DATA_DIR",
            "FSTORE_DATA_FILE",
            "FSTORE_UPLOADS_DIR",
        ]))
        .info(CompileTimeInformation::default())
        .print::<Markdown>();
}
