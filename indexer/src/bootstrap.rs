//! Built-in reference documents for a fresh store.

use docqa_core::{DocMeta, Document, DocumentStore};

/// Below this many documents the store is considered unseeded.
pub const MIN_DOCUMENTS: usize = 5;

const SEED_DOCS: &[(&str, &str, &str)] = &[
    (
        "STM32F767ZI basic specifications",
        "hardware",
        "STM32F767ZI microcontroller basic specifications:
- ARM Cortex-M7 core at 216 MHz
- 2 MB flash memory, 512 KB RAM
- 144-pin LQFP package, up to 114 GPIO pins
- 17 timers (basic, general purpose, advanced control)
- Communication: 4x UART, 6x SPI, 4x I2C, 3x CAN, 2x USB OTG
- 3x 12-bit ADC with up to 24 channels, 2x 12-bit DAC
- Operating voltage 1.7 V to 3.6 V",
    ),
    (
        "GPIO basic setup",
        "software",
        "STM32F767ZI GPIO basic setup:
1. Enable the port clock: __HAL_RCC_GPIOx_CLK_ENABLE();
2. Fill the init structure: GPIO_InitTypeDef GPIO_InitStruct = {0};
   GPIO_InitStruct.Pin = GPIO_PIN_x; GPIO_InitStruct.Mode = GPIO_MODE_OUTPUT_PP;
   GPIO_InitStruct.Pull = GPIO_NOPULL; GPIO_InitStruct.Speed = GPIO_SPEED_FREQ_LOW;
3. Initialize the pin: HAL_GPIO_Init(GPIOx, &GPIO_InitStruct);
4. Drive the output: HAL_GPIO_WritePin(GPIOx, GPIO_PIN_x, GPIO_PIN_SET);
   HAL_GPIO_WritePin(GPIOx, GPIO_PIN_x, GPIO_PIN_RESET);",
    ),
    (
        "UART communication setup",
        "software",
        "STM32F767ZI UART communication setup:
1. Initialize the handle: UART_HandleTypeDef huart3; huart3.Instance = USART3;
   huart3.Init.BaudRate = 115200; huart3.Init.WordLength = UART_WORDLENGTH_8B;
   huart3.Init.StopBits = UART_STOPBITS_1; huart3.Init.Parity = UART_PARITY_NONE;
   huart3.Init.Mode = UART_MODE_TX_RX; huart3.Init.HwFlowCtl = UART_HWCONTROL_NONE;
2. Transmit data: HAL_UART_Transmit(&huart3, (uint8_t*)data, strlen(data), HAL_MAX_DELAY);
3. Receive data: HAL_UART_Receive(&huart3, (uint8_t*)buffer, size, HAL_MAX_DELAY);",
    ),
    (
        "Simulink STM32 support",
        "software_tool",
        "MATLAB/Simulink STM32 support:
1. Install the Embedded Coder Support Package for STMicroelectronics STM32 Processors.
2. Model settings: target hardware STM32F7xx, board NUCLEO-F767ZI,
   hardware implementation STM32F767ZI.
3. Useful blocks: Digital Input/Output, Analog Input (ADC), PWM Output,
   Serial Receive/Transmit, Timer Counter.
4. Build with Ctrl+B to generate code and flash the board.",
    ),
];

pub fn seed_documents() -> Vec<Document> {
    SEED_DOCS
        .iter()
        .enumerate()
        .map(|(i, (title, category, content))| {
            let meta = DocMeta::new()
                .with_category(*category)
                .with_chunk_id(format!("bootstrap_{i}"))
                .with_extra("title", *title)
                .with_extra("source", "bootstrap");
            Document::new(*content, meta)
        })
        .collect()
}

pub fn is_needed(store: &DocumentStore) -> bool {
    store.len() < MIN_DOCUMENTS
}

pub fn seed(store: &DocumentStore, collection: &str) -> bool {
    let docs = seed_documents();
    let count = docs.len();
    let ok = store.insert(docs, collection);
    if ok {
        tracing::info!(count, collection, "bootstrapped reference documents");
    } else {
        tracing::error!(collection, "bootstrap insert failed");
    }
    ok
}
