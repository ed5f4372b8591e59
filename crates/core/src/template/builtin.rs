//! Built-in template fragments.
//!
//! Each project artifact is rendered from one of the root fragments below;
//! shared pieces (plugin sets, bootstrap helpers) are pulled in with
//! `@include`. Several fragments request the same plugin on purpose: a
//! monitor fragment declares the detectors it depends on even though the
//! core set already requested them, and the composer collapses the
//! duplicates.

/// `(name, source)` pairs registered by `FragmentStore::builtin()`.
pub const FRAGMENTS: &[(&str, &str)] = &[
    ("launch-s2e.sh", LAUNCH_SH),
    ("s2e-config.linux.lua", CONFIG_LINUX_LUA),
    ("s2e-config.windows.lua", CONFIG_WINDOWS_LUA),
    ("s2e-config.cgc.lua", CONFIG_CGC_LUA),
    ("lua-library", LUA_LIBRARY),
    ("plugins-core", PLUGINS_CORE),
    ("plugins-linux", PLUGINS_LINUX),
    ("plugins-windows", PLUGINS_WINDOWS),
    ("plugins-cgc", PLUGINS_CGC),
    ("plugins-seeds", PLUGINS_SEEDS),
    ("plugins-pov", PLUGINS_POV),
    ("bootstrap-common", BOOTSTRAP_COMMON),
    ("bootstrap.linux.sh", BOOTSTRAP_LINUX),
    ("bootstrap.windows.sh", BOOTSTRAP_WINDOWS),
    ("bootstrap.windows_dll.sh", BOOTSTRAP_WINDOWS_DLL),
    ("bootstrap.windows_driver.sh", BOOTSTRAP_WINDOWS_DRIVER),
    ("bootstrap.cgc.sh", BOOTSTRAP_CGC),
    ("instructions.txt", INSTRUCTIONS),
];

const LAUNCH_SH: &str = r#"#!/bin/sh
# Launch script for project {{project_name}}.
# Generated {{creation_time}}. Re-run `s2e new-project --force` to regenerate.

ENV_DIR="{{env_dir}}"
INSTALL_DIR="${ENV_DIR}/install"
QEMU="${INSTALL_DIR}/bin/qemu-system-{{qemu_arch}}"
IMAGE="${ENV_DIR}/images/{{image_path}}"

exec "${QEMU}" \
    -drive "file=${IMAGE},format=s2e,cache=writeback" \
    -serial file:serial.txt \
    -net none -net nic,model=e1000 \
    -m {{qemu_memory}} \
    -loadvm {{qemu_snapshot}} {{qemu_extra_flags}} \
    -s2e-config-file s2e-config.lua \
    -s2e-output-dir s2e-last
"#;

const LUA_LIBRARY: &str = r#"plugins = {}

function add_plugin(name)
    table.insert(plugins, name)
end

pluginsConfig = {}
"#;

const CONFIG_LINUX_LUA: &str = r#"-- S2E configuration for project {{project_name}}.
-- Generated {{creation_time}}.

s2e = {
    logging = {
        console = "debug",
        logLevel = "debug",
    },
    kleeArgs = {
@if use_cupa
        "--batch-time=5",
        "--use-batching-search=true",
@end
    },
}

@include lua-library

@include plugins-core
@include plugins-linux
@if use_seeds
@include plugins-seeds
@end
@if enable_pov_generation
@include plugins-pov
@end

pluginsConfig.HostFiles = {
    baseDirs = {
        "{{project_dir}}",
@if use_seeds
        "{{seeds_dir}}",
@end
    },
    allowWrite = true,
}

pluginsConfig.Vmi = {
    baseDirs = { "{{project_dir}}" },
}

pluginsConfig.ModuleExecutionDetector = {
    mod_0 = {
        moduleName = "{{target_name}}",
    },
    trackAllModules = false,
}

pluginsConfig.ProcessExecutionDetector = {
    moduleNames = {
        "{{target_name}}",
    },
}

pluginsConfig.LinuxMonitor = {
    terminateOnSegfault = true,
    terminateOnTrap = true,
}
@if use_seeds

pluginsConfig.SeedSearcher = {
    enableSeeds = true,
    seedDirectory = "{{seeds_dir}}",
}
@end
"#;

const CONFIG_WINDOWS_LUA: &str = r#"-- S2E configuration for project {{project_name}}.
-- Generated {{creation_time}}.

s2e = {
    logging = {
        console = "debug",
        logLevel = "debug",
    },
    kleeArgs = {
@if use_cupa
        "--batch-time=5",
        "--use-batching-search=true",
@end
    },
}

@include lua-library

@include plugins-core
@include plugins-windows
@if use_seeds
@include plugins-seeds
@end
@if enable_pov_generation
@include plugins-pov
@end

pluginsConfig.HostFiles = {
    baseDirs = {
        "{{project_dir}}",
    },
    allowWrite = true,
}

pluginsConfig.Vmi = {
    baseDirs = { "{{project_dir}}" },
}

pluginsConfig.ModuleExecutionDetector = {
    mod_0 = {
        moduleName = "{{target_name}}",
    },
    trackAllModules = false,
}

pluginsConfig.ProcessExecutionDetector = {
    moduleNames = {
        "{{target_name}}",
    },
}

pluginsConfig.WindowsMonitor = {
    userMode = true,
    kernelMode = {{use_fault_injection}},
}
@if use_fault_injection

pluginsConfig.FaultInjection = {
    faultInjectionActive = true,
}
@end
"#;

const CONFIG_CGC_LUA: &str = r#"-- S2E configuration for project {{project_name}}.
-- Generated {{creation_time}}.

s2e = {
    logging = {
        console = "debug",
        logLevel = "debug",
    },
    kleeArgs = {
        "--cgc-monitor",
@if use_cupa
        "--batch-time=5",
@end
    },
}

@include lua-library

@include plugins-core
@include plugins-cgc
@if use_seeds
@include plugins-seeds
@end

pluginsConfig.HostFiles = {
    baseDirs = {
        "{{project_dir}}",
        "{{seeds_dir}}",
    },
    allowWrite = true,
}

pluginsConfig.Vmi = {
    baseDirs = { "{{project_dir}}" },
}

pluginsConfig.ModuleExecutionDetector = {
    mod_0 = {
        moduleName = "{{target_name}}",
    },
    trackAllModules = false,
}

pluginsConfig.DecreeMonitor = {
    terminateOnSegfault = true,
    handleSymbolicAllocateMemory = true,
}

pluginsConfig.SeedSearcher = {
    enableSeeds = true,
    seedDirectory = "{{seeds_dir}}",
}

pluginsConfig.Recipe = {
    recipesDir = "{{recipes_dir}}",
}
"#;

const PLUGINS_CORE: &str = r#"@plugin BaseInstructions
@plugin HostFiles
@plugin Vmi
@plugin ExecutionTracer
@plugin ModuleTracer
@plugin ModuleExecutionDetector
@plugin ProcessExecutionDetector
@plugin ModuleMap
@if use_cupa
@plugin MultiSearcher
@plugin CUPASearcher
@end
@if use_test_case_generator
@plugin TestCaseGenerator
@end
@if use_fault_injection
@plugin FaultInjection
@end
"#;

const PLUGINS_LINUX: &str = r#"@plugin LinuxMonitor
@plugin ModuleExecutionDetector
@plugin ProcessExecutionDetector
"#;

const PLUGINS_WINDOWS: &str = r#"@plugin WindowsMonitor
@plugin WindowsCrashMonitor
@plugin BlueScreenInterceptor
@plugin ModuleExecutionDetector
"#;

const PLUGINS_CGC: &str = r#"@plugin DecreeMonitor
@plugin ModuleExecutionDetector
@plugin Recipe
@plugin POVGenerator
"#;

const PLUGINS_SEEDS: &str = r#"@plugin MultiSearcher
@plugin SeedSearcher
"#;

const PLUGINS_POV: &str = r#"@plugin Recipe
@plugin POVGenerator
"#;

const BOOTSTRAP_COMMON: &str = r#"S2EGET=./s2eget
S2EPUT=./s2eput
S2ECMD=./s2ecmd

function target_init {
    # Start the LinuxMonitor kernel module on images that ship it.
    if test -f /sbin/modprobe; then
        sudo modprobe s2e 2> /dev/null || true
    fi
}

function execute_target {
    local TARGET="$1"
    shift
    ./"${TARGET}" "$@" > /dev/null 2> /dev/null
}

function prepare_seed_file {
    ${S2EGET} seed-00 || ${S2ECMD} kill 1 "could not fetch seed file"
    SYMB_FILE=seed-00
}

function make_symbolic_file {
    ${S2ECMD} symbfile 1 input-00
    SYMB_FILE=input-00
}
"#;

const BOOTSTRAP_LINUX: &str = r#"#!/bin/bash
# Guest bootstrap for project {{project_name}}.
# Generated {{creation_time}}. S2E executes this inside the guest.

set -e

@include bootstrap-common

target_init

${S2EGET} "{{target_name}}"
chmod +x "{{target_name}}"

@if use_seeds
prepare_seed_file
@else
@if use_symb_input_file
make_symbolic_file
@end
@end
@if use_symb_input_file
TARGET_ARGS="{{target_args}}"
execute_target "{{target_name}}" ${TARGET_ARGS//@@/${SYMB_FILE}}
@else
@if sym_args
S2E_SYM_ARGS="{{sym_args}}" execute_target "{{target_name}}" {{target_args}}
@else
execute_target "{{target_name}}" {{target_args}}
@end
@end

${S2ECMD} kill 0 "bootstrap finished"
"#;

const BOOTSTRAP_WINDOWS: &str = r#"#!/bin/bash
# Guest bootstrap for project {{project_name}}.
# Generated {{creation_time}}. S2E executes this inside the guest.

set -e

@include bootstrap-common

${S2EGET} "{{target_name}}"

@if use_seeds
prepare_seed_file
@end
@if use_symb_input_file
TARGET_ARGS="{{target_args}}"
execute_target "{{target_name}}" ${TARGET_ARGS//@@/${SYMB_FILE}}
@else
execute_target "{{target_name}}" {{target_args}}
@end

${S2ECMD} kill 0 "bootstrap finished"
"#;

const BOOTSTRAP_WINDOWS_DLL: &str = r#"#!/bin/bash
# Guest bootstrap for project {{project_name}} (DLL target).
# Generated {{creation_time}}. The DLL is loaded through rundll32.

set -e

@include bootstrap-common

${S2EGET} "{{target_name}}"

# Exported entry point(s) to drive, first argument is the export name.
execute_target rundll32.exe "{{target_name}}",{{target_args}}

${S2ECMD} kill 0 "bootstrap finished"
"#;

const BOOTSTRAP_WINDOWS_DRIVER: &str = r#"#!/bin/bash
# Guest bootstrap for project {{project_name}} (driver target).
# Generated {{creation_time}}. Fault injection exercises error paths.

set -e

@include bootstrap-common

${S2EGET} "{{target_name}}"

# Register and start the driver; the WindowsMonitor plugin tracks the
# kernel-mode module from here on.
sc create s2etest binPath= "{{target_name}}" type= kernel
sc start s2etest

${S2ECMD} kill 0 "bootstrap finished"
"#;

const BOOTSTRAP_CGC: &str = r#"#!/bin/bash
# Guest bootstrap for project {{project_name}} (Decree challenge binary).
# Generated {{creation_time}}.

set -e

@include bootstrap-common

target_init

${S2EGET} "{{target_name}}"
chmod +x "{{target_name}}"

# Decree binaries always run under seed scheduling; the DecreeMonitor
# plugin feeds PoV generation from inside the guest.
prepare_seed_file
./cgccmd "{{target_name}}" < "${SYMB_FILE}"

${S2ECMD} kill 0 "bootstrap finished"
"#;

const INSTRUCTIONS: &str = r#"Project '{{project_name}}' created in {{project_dir}}

Target: {{target}} ({{image_arch}})
Image:  {{image}}

To start the analysis:

    cd {{project_dir}} && ./launch-s2e.sh

@if project_type == "linux"
@if dynamically_linked
The target is dynamically linked. Shared libraries are resolved inside
the guest; add any custom libraries to the project directory so they are
downloaded alongside the target.
@end
@end
@if use_seeds
Seed scheduling is enabled. Place seed files named seed-NN in
{{seeds_dir}} before launching.
@end
@if project_type == "cgc"
PoV generation is enabled; generated recipes are written to
{{recipes_dir}}.
@end

Edit s2e-config.lua to tune plugins and bootstrap.sh to change how the
target is invoked inside the guest.
"#;
